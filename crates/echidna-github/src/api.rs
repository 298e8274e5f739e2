//! The API trait and its request/response types.

use crate::error::Result;
use async_trait::async_trait;
use echidna_core::{Credential, ResultDescriptor, SortOrder};
use serde::{Deserialize, Serialize};

/// Trait for the code search API.
///
/// The HTTP client implements this against the real service; tests
/// implement it with scripted responses. Implementations must be
/// thread-safe since the throttle monitor calls it from a background task.
#[async_trait]
pub trait CodeSearchApi: Send + Sync {
    /// Check a token and return the account it belongs to.
    ///
    /// # Errors
    /// Returns error if the token is rejected or the request fails.
    async fn identity(&self, credential: &Credential) -> Result<Account>;

    /// Current quota of a token, or of anonymous access when `None`.
    async fn rate_limit(&self, credential: Option<&Credential>) -> Result<QuotaStatus>;

    /// Fetch one page of search results.
    async fn search(&self, credential: &Credential, request: &SearchRequest) -> Result<SearchPage>;

    /// Resolve an item's API URL to its metadata.
    async fn item_metadata(
        &self,
        credential: Option<&Credential>,
        url: &str,
    ) -> Result<ItemMetadata>;

    /// Download raw file content. Download URLs are unauthenticated.
    async fn raw_content(&self, download_url: &str) -> Result<String>;
}

/// Parameters of one search page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Search string
    #[serde(rename = "q")]
    pub query: String,
    /// Results per page
    pub per_page: u32,
    /// 1-based page number
    pub page: u32,
    /// Sort key
    pub sort: String,
    /// Sort direction
    pub order: SortOrder,
}

/// Account returned by the identity check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Account login
    pub login: String,
    /// Public email, if the account shows one
    #[serde(default)]
    pub email: Option<String>,
}

/// One quota bucket of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateStatus {
    /// Requests allowed per window
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// Window reset, seconds since the epoch
    #[serde(default)]
    pub reset: u64,
}

/// Quota of one identity, per bucket.
///
/// Code search has its own per-minute bucket, separate from the hourly
/// `core` bucket that item metadata and the top-level `rate` object report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuotaStatus {
    /// REST API bucket, used by item metadata requests
    pub core: RateStatus,
    /// Code search bucket
    pub search: RateStatus,
}

impl QuotaStatus {
    /// Whether both buckets have requests left.
    ///
    /// An identity can be throttled by either path, so it is only usable
    /// again once neither bucket is empty.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.core.remaining > 0 && self.search.remaining > 0
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResponse {
    pub(crate) resources: QuotaStatus,
}

/// One page of search results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    /// Total number of matching results
    pub total_count: u64,
    /// Whether the search timed out before finishing
    #[serde(default)]
    pub incomplete_results: bool,
    /// Results on this page, in sort order
    pub items: Vec<SearchItem>,
}

/// One search result as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    /// File path inside the repository
    pub path: String,
    /// API URL of the file
    pub url: String,
    /// Browsable URL
    pub html_url: String,
    /// Owning repository
    pub repository: Repository,
}

impl SearchItem {
    /// Flatten into the descriptor the rest of the pipeline works with.
    #[must_use]
    pub fn into_descriptor(self) -> ResultDescriptor {
        ResultDescriptor {
            path: self.path,
            url: self.url,
            html_url: self.html_url,
            owner_login: self.repository.owner.login,
            repo: self.repository.name,
        }
    }
}

/// Repository of a search result.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Repository owner
    pub owner: Owner,
}

/// Owner of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    /// Owner login
    pub login: String,
}

/// File metadata from the contents endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemMetadata {
    /// Raw download URL; absent for submodules and symlinks
    #[serde(default)]
    pub download_url: Option<String>,
}
