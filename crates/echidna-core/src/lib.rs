//! Echidna Core - Foundation crate for the Echidna code search scraper.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the other Echidna crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared domain types (`Credential`, `Identity`, `SortOrder`,
//!   `ResultDescriptor`, `MatchRecord`)
//!
//! # Example
//!
//! ```rust
//! use echidna_core::{AppConfig, Credential};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//! assert_eq!(config.search.ceiling(), 1000);
//!
//! let token = Credential::new("ghp_exampletoken0000")?;
//! println!("using {token}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, AppConfig, SearchConfig, ThrottleConfig};
pub use error::{ConfigError, ConfigResult, EchidnaError};
pub use types::{Credential, Identity, MatchRecord, ResultDescriptor, SortOrder};
