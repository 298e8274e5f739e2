//! Resolve search hits to their raw file content.

use echidna_github::CodeSearchApi;
use echidna_pool::CredentialPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Fetches file content for search results, rotating identities on throttling.
pub struct ItemFetcher {
    api: Arc<dyn CodeSearchApi>,
    pool: CredentialPool,
    backoff: Duration,
}

impl ItemFetcher {
    /// Create a fetcher drawing identities from `pool`.
    #[must_use]
    pub fn new(api: Arc<dyn CodeSearchApi>, pool: CredentialPool, backoff: Duration) -> Self {
        Self { api, pool, backoff }
    }

    /// Fetch the raw content behind an item's API URL.
    ///
    /// Throttling is retried indefinitely with other identities, sleeping
    /// whenever every token and anonymous access are throttled. Any other
    /// failure is logged and yields `None` so the caller can skip the item.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let metadata = loop {
            let Some(identity) = self.pool.next_identity() else {
                warn!(backoff = ?self.backoff, "all tokens and anonymous access are throttled, sleeping");
                tokio::time::sleep(self.backoff).await;
                continue;
            };

            match self.api.item_metadata(identity.credential(), url).await {
                Ok(metadata) => break metadata,
                Err(e) if e.is_rate_limited() => {
                    warn!(identity = %identity, "hit rate limiter");
                    self.pool.mark_throttled(&identity);
                }
                Err(e) => {
                    error!(url, status = ?e.status(), error = %e, "failed to resolve item, skipping");
                    return None;
                }
            }
        };

        let Some(download_url) = metadata.download_url else {
            warn!(url, "item has no download URL, skipping");
            return None;
        };

        match self.api.raw_content(&download_url).await {
            Ok(content) => {
                debug!(url, bytes = content.len(), "fetched item");
                Some(content)
            }
            Err(e) => {
                error!(url = %download_url, status = ?e.status(), error = %e, "failed to download item, skipping");
                None
            }
        }
    }
}
