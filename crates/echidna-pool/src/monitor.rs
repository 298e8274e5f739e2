//! Background recovery of throttled credentials.
//!
//! The monitor asks the quota endpoint directly instead of trusting the
//! reset time reported with the throttling response, so it can recover a
//! little late but never early.

use crate::pool::CredentialPool;
use echidna_github::CodeSearchApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Periodically polls the quota of every throttled identity.
pub struct ThrottleMonitor {
    pool: CredentialPool,
    api: Arc<dyn CodeSearchApi>,
    interval: Duration,
}

impl ThrottleMonitor {
    /// Create a monitor over `pool` that polls every `interval`.
    #[must_use]
    pub fn new(pool: CredentialPool, api: Arc<dyn CodeSearchApi>, interval: Duration) -> Self {
        Self {
            pool,
            api,
            interval,
        }
    }

    /// Check every throttled identity once and reactivate those with quota
    /// left in both the search and core buckets. Returns how many were
    /// recovered.
    ///
    /// Quota lookups that fail leave the identity throttled until the next
    /// sweep.
    pub async fn poll_once(&self) -> usize {
        let throttled = self.pool.throttled();
        if throttled.is_empty() {
            return 0;
        }
        debug!(count = throttled.len(), "checking throttled identities");

        let mut recovered = 0;
        for identity in throttled {
            match self.api.rate_limit(identity.credential()).await {
                Ok(quota) if quota.is_available() => {
                    if self.pool.mark_recovered(&identity) {
                        info!(
                            identity = %identity,
                            search_remaining = quota.search.remaining,
                            core_remaining = quota.core.remaining,
                            "identity is no longer throttled"
                        );
                        recovered += 1;
                    }
                }
                Ok(quota) => {
                    debug!(
                        identity = %identity,
                        search_reset = quota.search.reset,
                        core_reset = quota.core.reset,
                        "still throttled"
                    );
                }
                Err(e) => {
                    warn!(identity = %identity, error = %e, "failed to check quota");
                }
            }
        }
        recovered
    }

    /// Run forever on the current runtime.
    ///
    /// The task holds only the pool and the API client. Dropping the handle
    /// detaches the task; only `abort()` on the handle (or process exit)
    /// stops it.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval = ?self.interval, "throttle monitor started");
            loop {
                self.poll_once().await;
                tokio::time::sleep(self.interval).await;
            }
        })
    }
}
