//! Echidna GitHub - client for the code search API.
//!
//! This crate wraps the five endpoints the scraper needs behind the
//! [`CodeSearchApi`] trait:
//!
//! - identity check (`/user`) used to validate tokens at startup
//! - quota status (`/rate_limit`) polled by the throttle monitor
//! - code search (`/search/code`) driven page by page
//! - item metadata (the `url` of each search hit) resolving a download URL
//! - raw content (the download URL itself)
//!
//! Non-success responses are classified into [`ApiError`] variants so callers
//! can tell throttling and out-of-range pages apart from real failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use echidna_core::{ApiConfig, Credential, SortOrder};
//! use echidna_github::{CodeSearchApi, GitHubClient, SearchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(&ApiConfig::default())?;
//! let token = Credential::new("ghp_exampletoken0000")?;
//!
//! let account = client.identity(&token).await?;
//! println!("authenticated as {}", account.login);
//!
//! let page = client
//!     .search(
//!         &token,
//!         &SearchRequest {
//!             query: "AKIA language:python".to_string(),
//!             per_page: 100,
//!             page: 1,
//!             sort: "indexed".to_string(),
//!             order: SortOrder::Desc,
//!         },
//!     )
//!     .await?;
//! println!("{} results", page.total_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod client;
pub mod error;

// Re-export commonly used types
pub use api::{
    Account, CodeSearchApi, ItemMetadata, Owner, QuotaStatus, RateStatus, Repository, SearchItem,
    SearchPage, SearchRequest,
};
pub use client::{build_http_client, GitHubClient};
pub use error::{ApiError, Result};
