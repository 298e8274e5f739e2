//! Echidna Scanner - search, fetch and match orchestration.
//!
//! This crate turns one search query into a stream of match records:
//!
//! - [`SearchDriver`] pages through the query, flipping sort order at the
//!   result ceiling to reach up to twice as many results
//! - [`ItemFetcher`] downloads each result's content, rotating credentials
//!   when one is throttled
//! - [`Matcher`] applies the user pattern to the content
//! - [`RecordSink`] appends matches as JSON lines
//! - [`Scanner`] runs all of the above sequentially
//!
//! # Example
//!
//! ```rust,ignore
//! use echidna_scanner::{ItemFetcher, Matcher, RecordSink, Scanner, SearchCursor, SearchDriver};
//!
//! let driver = SearchDriver::new(
//!     api.clone(),
//!     pool.clone(),
//!     config.search.clone(),
//!     config.throttle.backoff(),
//!     SearchCursor::new("AKIA language:python", 1),
//! );
//! let fetcher = ItemFetcher::new(api, pool, config.throttle.backoff());
//! let scanner = Scanner::new(driver, fetcher, Matcher::new("AKIA[0-9A-Z]{16}")?, RecordSink::new(None, true)?);
//!
//! let summary = scanner.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod driver;
#[allow(missing_docs)]
pub mod error;
pub mod fetcher;
pub mod matcher;
pub mod output;
pub mod scanner;

// Re-export commonly used types
pub use driver::{ConfirmFn, DriverState, SearchCursor, SearchDriver};
pub use error::{Result, ScanError};
pub use fetcher::ItemFetcher;
pub use matcher::{MatchSet, Matcher};
pub use output::RecordSink;
pub use scanner::{ScanSummary, Scanner};
