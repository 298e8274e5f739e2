//! Scripted in-memory stand-in for the code search API.
//!
//! The dataset is `total` files with ids `1..=total`, id order being index
//! order: descending sweeps start at `total`, ascending sweeps at 1. Pages
//! past `max_pages` are refused with 422, like the real endpoint.

#![allow(dead_code)]

use async_trait::async_trait;
use echidna_core::{Credential, SortOrder};
use echidna_github::{
    Account, ApiError, CodeSearchApi, ItemMetadata, Owner, QuotaStatus, RateStatus, Repository,
    SearchItem, SearchPage, SearchRequest,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const RATE_LIMIT_BODY: &str = r#"{"message":"API rate limit exceeded"}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub token: String,
    pub page: u32,
    pub order: SortOrder,
}

pub struct MockApi {
    pub total: u64,
    pub max_pages: u32,
    /// Tokens (`None` = anonymous) that get 403 rate-limit responses
    pub throttled: Mutex<HashSet<Option<String>>>,
    /// Status code returned for every search, if set
    pub search_failure: Mutex<Option<u16>>,
    /// Item URLs whose metadata request fails with 500
    pub broken_items: Mutex<HashSet<String>>,
    /// Item URLs without a download URL
    pub undownloadable: Mutex<HashSet<String>>,
    /// Raw content by item URL
    pub contents: Mutex<HashMap<String, String>>,
    pub search_calls: Mutex<Vec<SearchCall>>,
    pub metadata_calls: Mutex<Vec<(Option<String>, String)>>,
}

impl MockApi {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            max_pages: 10,
            throttled: Mutex::new(HashSet::new()),
            search_failure: Mutex::new(None),
            broken_items: Mutex::new(HashSet::new()),
            undownloadable: Mutex::new(HashSet::new()),
            contents: Mutex::new(HashMap::new()),
            search_calls: Mutex::new(Vec::new()),
            metadata_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn item_url(id: u64) -> String {
        format!("https://api.test/repositories/7/contents/src/file{id}.py")
    }

    pub fn throttle(&self, credential: Option<&Credential>) {
        self.throttled
            .lock()
            .unwrap()
            .insert(credential.map(|c| c.expose().to_string()));
    }

    pub fn unthrottle(&self, credential: Option<&Credential>) {
        self.throttled
            .lock()
            .unwrap()
            .remove(&credential.map(|c| c.expose().to_string()));
    }

    pub fn set_content(&self, id: u64, content: &str) {
        self.contents
            .lock()
            .unwrap()
            .insert(Self::item_url(id), content.to_string());
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn metadata_tokens(&self) -> Vec<Option<String>> {
        self.metadata_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }

    fn is_throttled(&self, credential: Option<&Credential>) -> bool {
        self.throttled
            .lock()
            .unwrap()
            .contains(&credential.map(|c| c.expose().to_string()))
    }

    fn item(id: u64) -> SearchItem {
        SearchItem {
            path: format!("src/file{id}.py"),
            url: Self::item_url(id),
            html_url: format!("https://github.test/octo/demo/blob/main/src/file{id}.py"),
            repository: Repository {
                name: "demo".to_string(),
                owner: Owner {
                    login: "octo".to_string(),
                },
            },
        }
    }

    fn page_ids(&self, request: &SearchRequest) -> Vec<u64> {
        let per_page = u64::from(request.per_page);
        let skip = u64::from(request.page - 1) * per_page;
        if skip >= self.total {
            return Vec::new();
        }
        let count = per_page.min(self.total - skip);
        match request.order {
            SortOrder::Asc => (skip + 1..=skip + count).collect(),
            SortOrder::Desc => (0..count).map(|i| self.total - skip - i).collect(),
        }
    }
}

#[async_trait]
impl CodeSearchApi for MockApi {
    async fn identity(&self, _: &Credential) -> echidna_github::Result<Account> {
        Ok(Account {
            login: "octo".to_string(),
            email: None,
        })
    }

    async fn rate_limit(&self, credential: Option<&Credential>) -> echidna_github::Result<QuotaStatus> {
        let remaining = if self.is_throttled(credential) { 0 } else { 30 };
        Ok(QuotaStatus {
            core: RateStatus {
                limit: 5000,
                remaining: 4990,
                reset: 0,
            },
            search: RateStatus {
                limit: 30,
                remaining,
                reset: 0,
            },
        })
    }

    async fn search(
        &self,
        credential: &Credential,
        request: &SearchRequest,
    ) -> echidna_github::Result<SearchPage> {
        self.search_calls.lock().unwrap().push(SearchCall {
            token: credential.expose().to_string(),
            page: request.page,
            order: request.order,
        });

        if self.is_throttled(Some(credential)) {
            return Err(ApiError::classify(403, RATE_LIMIT_BODY.to_string()));
        }
        if let Some(status) = *self.search_failure.lock().unwrap() {
            return Err(ApiError::classify(status, "server error".to_string()));
        }
        if request.page > self.max_pages {
            return Err(ApiError::classify(
                422,
                "Cannot access beyond the first 1000 results".to_string(),
            ));
        }

        Ok(SearchPage {
            total_count: self.total,
            incomplete_results: false,
            items: self.page_ids(request).into_iter().map(Self::item).collect(),
        })
    }

    async fn item_metadata(
        &self,
        credential: Option<&Credential>,
        url: &str,
    ) -> echidna_github::Result<ItemMetadata> {
        self.metadata_calls
            .lock()
            .unwrap()
            .push((credential.map(|c| c.expose().to_string()), url.to_string()));

        if self.is_throttled(credential) {
            return Err(ApiError::classify(403, RATE_LIMIT_BODY.to_string()));
        }
        if self.broken_items.lock().unwrap().contains(url) {
            return Err(ApiError::classify(500, "server error".to_string()));
        }
        if self.undownloadable.lock().unwrap().contains(url) {
            return Ok(ItemMetadata { download_url: None });
        }
        Ok(ItemMetadata {
            download_url: Some(format!("{url}?raw")),
        })
    }

    async fn raw_content(&self, download_url: &str) -> echidna_github::Result<String> {
        let url = download_url.trim_end_matches("?raw");
        Ok(self
            .contents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| "nothing to see here".to_string()))
    }
}

pub fn token(name: &str) -> Credential {
    Credential::new(format!("ghp_{name}")).expect("valid token")
}
