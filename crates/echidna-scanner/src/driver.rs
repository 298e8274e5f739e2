//! Paginated search driver.
//!
//! The search endpoint serves at most `per_page * max_pages` results per
//! sort direction. When a query has more than that, the driver walks the
//! newest results first, remembers the last one it emitted (the sentinel),
//! then restarts from page 1 in ascending order. The ascending sweep stops
//! as soon as it reaches the sentinel, so the two sweeps meet without
//! duplicates. Anything beyond twice the ceiling cannot be reached.

use echidna_core::{Identity, ResultDescriptor, SearchConfig, SortOrder};
use echidna_github::{ApiError, CodeSearchApi, SearchPage, SearchRequest};
use echidna_pool::CredentialPool;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Hook asked once, with the total result count, before paging through a
/// large query. Returning `false` stops the search.
pub type ConfirmFn = Box<dyn FnMut(u64) -> bool + Send>;

/// Where the driver is in its sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Requesting or emitting pages
    Searching,
    /// Every token is throttled; waiting for one to recover
    AwaitingCredential,
    /// Ceiling reached; the reverse sweep starts with the next request
    Flipping,
    /// No more results
    Exhausted,
    /// Stopped on an unexpected API response
    Failed,
    /// The large-query confirmation was refused
    Declined,
}

impl DriverState {
    /// Whether the driver will produce no more items.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed | Self::Declined)
    }
}

/// Position of a search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    query: String,
    page: u32,
    order: SortOrder,
    total: Option<u64>,
    sentinel: Option<String>,
    flipped: bool,
}

impl SearchCursor {
    /// Newest-first cursor starting at `start_page`.
    #[must_use]
    pub fn new(query: impl Into<String>, start_page: u32) -> Self {
        Self {
            query: query.into(),
            page: start_page.max(1),
            order: SortOrder::Desc,
            total: None,
            sentinel: None,
            flipped: false,
        }
    }

    /// Oldest-first cursor. It counts as already flipped, so it never
    /// flips again and only the oldest ceiling's worth of results is seen.
    #[must_use]
    pub fn reversed(query: impl Into<String>, start_page: u32) -> Self {
        Self {
            order: SortOrder::Asc,
            flipped: true,
            ..Self::new(query, start_page)
        }
    }

    /// The search string.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Page to request next.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Current sort direction.
    #[must_use]
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Total result count from the latest response.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Identity of the last item emitted before the flip.
    #[must_use]
    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    /// Whether the sweep runs in reverse.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Page count for the latest total.
    #[must_use]
    pub fn total_pages(&self, per_page: u32) -> Option<u64> {
        self.total
            .map(|total| total.div_ceil(u64::from(per_page.max(1))))
    }

    /// Reverse the sweep, remembering `sentinel` as the seam.
    ///
    /// Only the first call has any effect.
    fn flip(&mut self, sentinel: String) {
        if self.flipped {
            return;
        }
        self.sentinel = Some(sentinel);
        self.flipped = true;
        self.order = SortOrder::Asc;
        self.page = 1;
    }
}

/// Lazily walks one query's results across pages and both sort directions.
pub struct SearchDriver {
    api: Arc<dyn CodeSearchApi>,
    pool: CredentialPool,
    config: SearchConfig,
    backoff: Duration,
    cursor: SearchCursor,
    confirm: Option<ConfirmFn>,
    first_response_seen: bool,
    buffer: VecDeque<ResultDescriptor>,
    state: DriverState,
    emitted: u64,
}

impl SearchDriver {
    /// Create a driver positioned at `cursor`.
    #[must_use]
    pub fn new(
        api: Arc<dyn CodeSearchApi>,
        pool: CredentialPool,
        config: SearchConfig,
        backoff: Duration,
        cursor: SearchCursor,
    ) -> Self {
        Self {
            api,
            pool,
            config,
            backoff,
            cursor,
            confirm: None,
            first_response_seen: false,
            buffer: VecDeque::new(),
            state: DriverState::Searching,
            emitted: 0,
        }
    }

    /// Ask `confirm` before paging through a query whose total exceeds the
    /// confirmation threshold.
    #[must_use]
    pub fn with_confirmation(mut self, confirm: ConfirmFn) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Current cursor.
    #[must_use]
    pub fn cursor(&self) -> &SearchCursor {
        &self.cursor
    }

    /// Items handed out so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Next result, or `None` once the search is over.
    ///
    /// Pages are requested only when the previous page has been consumed.
    pub async fn next(&mut self) -> Option<ResultDescriptor> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.emitted += 1;
                return Some(item);
            }
            if self.state.is_terminal() {
                return None;
            }
            self.advance().await;
        }
    }

    /// Turn the driver into a stream of results.
    pub fn into_stream(self) -> impl Stream<Item = ResultDescriptor> {
        stream::unfold(self, |mut driver| async move {
            driver.next().await.map(|item| (item, driver))
        })
    }

    /// Request the page under the cursor and process it.
    async fn advance(&mut self) {
        if let Some(pages) = self.cursor.total_pages(self.config.per_page) {
            if u64::from(self.cursor.page) > pages {
                info!("search has exhausted, all done");
                self.state = DriverState::Exhausted;
                return;
            }
        }

        info!(
            page = self.cursor.page,
            order = %self.cursor.order,
            "requesting page"
        );

        match self.request_page().await {
            Ok(page) => self.handle_page(page),
            Err(ApiError::PageOutOfRange { .. }) if self.cursor.flipped => {
                info!("reversed search has run past the last page, all done");
                self.state = DriverState::Exhausted;
            }
            Err(e) => {
                error!(
                    status = ?e.status(),
                    error = %e,
                    page = self.cursor.page,
                    "unexpected search response, stopping"
                );
                self.state = DriverState::Failed;
            }
        }
    }

    /// Issue the search with the next available token, waiting while every
    /// token is throttled and rotating away from tokens that get throttled.
    async fn request_page(&mut self) -> Result<SearchPage, ApiError> {
        let request = SearchRequest {
            query: self.cursor.query.clone(),
            per_page: self.config.per_page,
            page: self.cursor.page,
            sort: self.config.sort.clone(),
            order: self.cursor.order,
        };

        loop {
            let Some(credential) = self.pool.next() else {
                warn!(backoff = ?self.backoff, "all tokens throttled, sleeping");
                self.state = DriverState::AwaitingCredential;
                tokio::time::sleep(self.backoff).await;
                continue;
            };
            self.state = DriverState::Searching;

            match self.api.search(&credential, &request).await {
                Err(e) if e.is_rate_limited() => {
                    warn!(token = %credential, "token throttled");
                    self.pool.mark_throttled(&Identity::Token(credential));
                }
                other => return other,
            }
        }
    }

    fn handle_page(&mut self, page: SearchPage) {
        let total = page.total_count;
        self.cursor.total = Some(total);

        if !self.first_response_seen {
            self.first_response_seen = true;
            if !self.on_first_response(total) {
                info!(total, "large query declined");
                self.state = DriverState::Declined;
                return;
            }
        }

        if page.incomplete_results {
            warn!(page = self.cursor.page, "search timed out upstream, page may be partial");
        }

        let Some(last_url) = page.items.last().map(|item| item.url.clone()) else {
            info!(page = self.cursor.page, "empty page, all done");
            self.state = DriverState::Exhausted;
            return;
        };

        for item in page.items {
            if self.cursor.flipped && self.cursor.sentinel.as_deref() == Some(item.url.as_str()) {
                info!("reversed search order has reached the last item, all done");
                self.state = DriverState::Exhausted;
                return;
            }
            self.buffer.push_back(item.into_descriptor());
        }

        if !self.cursor.flipped
            && total > self.config.ceiling()
            && self.cursor.page == self.config.max_pages
        {
            self.state = DriverState::Flipping;
            info!(
                ceiling = self.config.ceiling(),
                reachable = self.config.reachable(),
                "reached the result ceiling, reversing search order"
            );
            // Stays `Flipping` until the first ascending page is requested
            self.cursor.flip(last_url);
        } else {
            self.cursor.page += 1;
            self.state = DriverState::Searching;
        }
    }

    /// Report the total and run the confirmation hook. Returns `false` if
    /// the search should stop.
    fn on_first_response(&mut self, total: u64) -> bool {
        info!(
            total,
            pages = self.cursor.total_pages(self.config.per_page).unwrap_or(0),
            "found results"
        );

        if total > self.config.reachable() {
            warn!(
                total,
                reachable = self.config.reachable(),
                "query exceeds the reachable result count, narrow it with qualifiers such as language: or -extension:"
            );
        }

        if total <= self.config.confirm_threshold {
            return true;
        }
        match self.confirm.as_mut() {
            Some(confirm) => confirm(total),
            None => {
                debug!(total, "no confirmation hook, continuing");
                true
            }
        }
    }
}
