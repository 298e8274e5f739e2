//! Credential pool and round-robin rotator.
//!
//! The pool owns every credential that survived startup validation. Each one
//! is either in the active sequence (usable, in rotation order) or in the
//! throttled map (waiting for its quota to refill). Rejected credentials are
//! never added, so they are absent from both. The anonymous identity is
//! active whenever it is not in the throttled map.
//!
//! Both structures and the rotation cursor sit behind one mutex, so the
//! throttle monitor and the main flow always see a consistent pool.

use crate::error::{PoolError, Result};
use chrono::{DateTime, Utc};
use echidna_core::{Credential, Identity};
use echidna_github::CodeSearchApi;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Authenticated code search requests allowed per token per minute.
pub const SEARCH_REQUESTS_PER_MINUTE: usize = 30;

#[derive(Debug, Default)]
struct PoolState {
    /// Usable credentials, in rotation order
    active: Vec<Credential>,
    /// Index of the next credential to hand out
    cursor: usize,
    /// Throttled identities and when they were throttled
    throttled: HashMap<Identity, DateTime<Utc>>,
}

/// Shared, lock-guarded pool of validated credentials.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    state: Arc<Mutex<PoolState>>,
}

impl CredentialPool {
    /// Create a pool whose active sequence is `credentials`, in order.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    #[must_use]
    pub fn new(credentials: Vec<Credential>) -> Self {
        let mut active: Vec<Credential> = Vec::with_capacity(credentials.len());
        for credential in credentials {
            if !active.contains(&credential) {
                active.push(credential);
            }
        }

        Self {
            state: Arc::new(Mutex::new(PoolState {
                active,
                ..PoolState::default()
            })),
        }
    }

    /// Validate every candidate against the identity endpoint and build a
    /// pool from the ones that pass.
    ///
    /// Candidates are checked one at a time. Rejected candidates are logged
    /// and dropped for good.
    ///
    /// # Errors
    /// Returns `PoolError::NoValidCredentials` if no candidate passes.
    pub async fn validate_all(api: &dyn CodeSearchApi, candidates: Vec<Credential>) -> Result<Self> {
        let mut valid = Vec::with_capacity(candidates.len());
        let mut rejected = 0;

        for candidate in candidates {
            match api.identity(&candidate).await {
                Ok(account) => {
                    info!(
                        token = %candidate,
                        user = %account.login,
                        email = account.email.as_deref().unwrap_or("-"),
                        "valid token"
                    );
                    valid.push(candidate);
                }
                Err(e) => {
                    warn!(token = %candidate, error = %e, "login failed, token will be ignored");
                    rejected += 1;
                }
            }
        }

        if valid.is_empty() {
            return Err(PoolError::NoValidCredentials { rejected });
        }

        let pool = Self::new(valid);
        info!(
            tokens = pool.active_len(),
            rejected,
            requests_per_minute = pool.requests_per_minute(),
            "credential pool ready"
        );
        Ok(pool)
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().expect("credential pool lock poisoned")
    }

    /// Next active credential in round-robin order, or `None` if every
    /// credential is throttled.
    ///
    /// The cursor is clamped on every call because the active sequence can
    /// shrink or grow between calls.
    #[must_use]
    pub fn next(&self) -> Option<Credential> {
        let mut state = self.lock();
        if state.active.is_empty() {
            return None;
        }
        if state.cursor >= state.active.len() {
            state.cursor = 0;
        }
        let credential = state.active[state.cursor].clone();
        state.cursor += 1;
        Some(credential)
    }

    /// Next usable identity: a token if any is active, otherwise anonymous
    /// access unless that is throttled too.
    #[must_use]
    pub fn next_identity(&self) -> Option<Identity> {
        if let Some(credential) = self.next() {
            return Some(Identity::Token(credential));
        }
        let state = self.lock();
        if state.throttled.contains_key(&Identity::Anonymous) {
            None
        } else {
            Some(Identity::Anonymous)
        }
    }

    /// Move an identity from the active set to the throttled map.
    ///
    /// Removes exactly that credential, wherever it sits in the rotation.
    /// Returns `false` if nothing changed (already throttled, or a token the
    /// pool does not hold).
    pub fn mark_throttled(&self, identity: &Identity) -> bool {
        let mut state = self.lock();

        match identity {
            Identity::Token(credential) => {
                let Some(index) = state.active.iter().position(|c| c == credential) else {
                    return false;
                };
                state.active.remove(index);
                // Keep the rotation where it was for the credentials that remain
                if index < state.cursor {
                    state.cursor -= 1;
                }
            }
            Identity::Anonymous => {
                if state.throttled.contains_key(identity) {
                    return false;
                }
            }
        }

        state.throttled.insert(identity.clone(), Utc::now());
        true
    }

    /// Move an identity from the throttled map back into rotation.
    ///
    /// Recovered tokens join the end of the active sequence. Returns `false`
    /// if the identity was not throttled.
    pub fn mark_recovered(&self, identity: &Identity) -> bool {
        let mut state = self.lock();

        if state.throttled.remove(identity).is_none() {
            return false;
        }
        if let Identity::Token(credential) = identity {
            if !state.active.contains(credential) {
                state.active.push(credential.clone());
            }
        }
        true
    }

    /// Snapshot of the active sequence, in rotation order.
    #[must_use]
    pub fn active(&self) -> Vec<Credential> {
        self.lock().active.clone()
    }

    /// Number of active tokens.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.lock().active.len()
    }

    /// Snapshot of the throttled identities.
    #[must_use]
    pub fn throttled(&self) -> Vec<Identity> {
        self.lock().throttled.keys().cloned().collect()
    }

    /// Whether an identity is currently throttled.
    #[must_use]
    pub fn is_throttled(&self, identity: &Identity) -> bool {
        self.lock().throttled.contains_key(identity)
    }

    /// When an identity was throttled, if it is.
    #[must_use]
    pub fn throttled_since(&self, identity: &Identity) -> Option<DateTime<Utc>> {
        self.lock().throttled.get(identity).copied()
    }

    /// Sustained search budget of the active tokens, kept one under the
    /// combined limit.
    #[must_use]
    pub fn requests_per_minute(&self) -> usize {
        (self.active_len() * SEARCH_REQUESTS_PER_MINUTE).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use echidna_github::{Account, ApiError, ItemMetadata, QuotaStatus, SearchPage, SearchRequest};
    use std::collections::HashSet;

    fn token(name: &str) -> Credential {
        Credential::new(format!("ghp_{name}")).expect("valid token")
    }

    fn pool_of(names: &[&str]) -> CredentialPool {
        CredentialPool::new(names.iter().map(|n| token(n)).collect())
    }

    /// Accepts tokens whose secret ends in "ok".
    struct IdentityOnly;

    #[async_trait]
    impl CodeSearchApi for IdentityOnly {
        async fn identity(&self, credential: &Credential) -> echidna_github::Result<Account> {
            if credential.expose().ends_with("ok") {
                Ok(Account {
                    login: "octo".to_string(),
                    email: None,
                })
            } else {
                Err(ApiError::Unexpected {
                    status: 401,
                    body: "Bad credentials".to_string(),
                })
            }
        }

        async fn rate_limit(&self, _: Option<&Credential>) -> echidna_github::Result<QuotaStatus> {
            unreachable!("not used")
        }

        async fn search(
            &self,
            _: &Credential,
            _: &SearchRequest,
        ) -> echidna_github::Result<SearchPage> {
            unreachable!("not used")
        }

        async fn item_metadata(
            &self,
            _: Option<&Credential>,
            _: &str,
        ) -> echidna_github::Result<ItemMetadata> {
            unreachable!("not used")
        }

        async fn raw_content(&self, _: &str) -> echidna_github::Result<String> {
            unreachable!("not used")
        }
    }

    #[test]
    fn test_round_robin_order() {
        let pool = pool_of(&["a", "b", "c"]);
        let order: Vec<_> = (0..6).map(|_| pool.next().unwrap()).collect();
        assert_eq!(
            order,
            vec![token("a"), token("b"), token("c"), token("a"), token("b"), token("c")]
        );
    }

    #[test]
    fn test_empty_pool_yields_none() {
        let pool = CredentialPool::new(Vec::new());
        assert!(pool.next().is_none());
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let pool = pool_of(&["a", "b", "a"]);
        assert_eq!(pool.active(), vec![token("a"), token("b")]);
    }

    #[test]
    fn test_each_credential_once_after_mutation() {
        let pool = pool_of(&["a", "b", "c", "d"]);
        // Advance into the middle of the rotation, then shrink and grow it
        let _ = pool.next();
        let _ = pool.next();
        let _ = pool.next();
        assert!(pool.mark_throttled(&Identity::from(token("b"))));
        assert!(pool.mark_throttled(&Identity::from(token("d"))));

        let seen: HashSet<_> = (0..2).map(|_| pool.next().unwrap()).collect();
        assert_eq!(seen, [token("a"), token("c")].into_iter().collect());

        assert!(pool.mark_recovered(&Identity::from(token("d"))));
        let seen: Vec<_> = (0..3).map(|_| pool.next().unwrap()).collect();
        let unique: HashSet<_> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(unique, [token("a"), token("c"), token("d")].into_iter().collect());
    }

    #[test]
    fn test_throttle_removes_exact_credential() {
        let pool = pool_of(&["a", "b", "c"]);
        assert!(pool.mark_throttled(&Identity::from(token("b"))));

        assert_eq!(pool.active(), vec![token("a"), token("c")]);
        assert!(pool.is_throttled(&Identity::from(token("b"))));
        assert!(!pool.is_throttled(&Identity::from(token("a"))));
        assert!(pool.throttled_since(&Identity::from(token("b"))).is_some());
    }

    #[test]
    fn test_throttle_and_recover_are_idempotent() {
        let pool = pool_of(&["a", "b"]);
        let b = Identity::from(token("b"));

        assert!(pool.mark_throttled(&b));
        assert!(!pool.mark_throttled(&b));
        assert_eq!(pool.throttled().len(), 1);

        assert!(pool.mark_recovered(&b));
        assert!(!pool.mark_recovered(&b));
        assert_eq!(pool.active_len(), 2);
        assert!(pool.throttled().is_empty());
    }

    #[test]
    fn test_throttle_then_recover_restores_set() {
        let pool = pool_of(&["a", "b", "c"]);
        let before: HashSet<_> = pool.active().into_iter().collect();

        let a = Identity::from(token("a"));
        pool.mark_throttled(&a);
        pool.mark_recovered(&a);

        let after: HashSet<_> = pool.active().into_iter().collect();
        assert_eq!(before, after);
        // Recovered credentials rejoin at the end
        assert_eq!(pool.active().last(), Some(&token("a")));
    }

    #[test]
    fn test_unknown_token_is_not_throttled() {
        let pool = pool_of(&["a"]);
        assert!(!pool.mark_throttled(&Identity::from(token("zzz"))));
        assert!(pool.throttled().is_empty());
    }

    #[test]
    fn test_credential_in_exactly_one_set() {
        let pool = pool_of(&["a", "b"]);
        let a = Identity::from(token("a"));

        pool.mark_throttled(&a);
        assert!(!pool.active().contains(&token("a")));
        assert!(pool.is_throttled(&a));

        pool.mark_recovered(&a);
        assert!(pool.active().contains(&token("a")));
        assert!(!pool.is_throttled(&a));
    }

    #[test]
    fn test_anonymous_fallback() {
        let pool = pool_of(&["a"]);
        pool.mark_throttled(&Identity::from(token("a")));

        assert_eq!(pool.next_identity(), Some(Identity::Anonymous));

        assert!(pool.mark_throttled(&Identity::Anonymous));
        assert!(!pool.mark_throttled(&Identity::Anonymous));
        assert_eq!(pool.next_identity(), None);

        assert!(pool.mark_recovered(&Identity::Anonymous));
        assert_eq!(pool.next_identity(), Some(Identity::Anonymous));
        // Anonymous recovery never adds anything to the token rotation
        assert_eq!(pool.active_len(), 0);
    }

    #[test]
    fn test_requests_per_minute() {
        assert_eq!(pool_of(&["a", "b"]).requests_per_minute(), 59);
        assert_eq!(CredentialPool::new(Vec::new()).requests_per_minute(), 0);
    }

    #[tokio::test]
    async fn test_validate_all_keeps_accepted_tokens() {
        let candidates = vec![token("one_ok"), token("two_bad"), token("three_ok")];
        let pool = CredentialPool::validate_all(&IdentityOnly, candidates)
            .await
            .expect("some tokens are valid");
        assert_eq!(pool.active(), vec![token("one_ok"), token("three_ok")]);
        // Rejected tokens are in neither set
        assert!(!pool.is_throttled(&Identity::from(token("two_bad"))));
    }

    #[tokio::test]
    async fn test_validate_all_fails_without_valid_tokens() {
        let result = CredentialPool::validate_all(&IdentityOnly, vec![token("bad")]).await;
        assert!(matches!(
            result,
            Err(PoolError::NoValidCredentials { rejected: 1 })
        ));
    }
}
