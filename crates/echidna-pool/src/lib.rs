//! Echidna Pool - credential rotation and throttle recovery.
//!
//! Every outbound request takes its credential from a [`CredentialPool`],
//! which hands out active tokens in round-robin order. A credential that
//! hits its rate limit is moved to the throttled map by the caller, and a
//! [`ThrottleMonitor`] running in the background moves it back once the
//! quota endpoint reports remaining budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use echidna_pool::{CredentialPool, ThrottleMonitor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let pool = CredentialPool::validate_all(api.as_ref(), candidates).await?;
//! let _monitor = ThrottleMonitor::new(pool.clone(), api.clone(), Duration::from_secs(10)).spawn();
//!
//! while let Some(token) = pool.next() {
//!     // issue a request with `token`
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod monitor;
pub mod pool;

// Re-export commonly used types
pub use error::{PoolError, Result};
pub use monitor::ThrottleMonitor;
pub use pool::{CredentialPool, SEARCH_REQUESTS_PER_MINUTE};
