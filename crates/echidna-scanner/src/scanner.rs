//! Scan loop tying the driver, fetcher, matcher and output together.
//!
//! Items are processed strictly one at a time: search page, then each
//! item's metadata and content, in order. Concurrent requests trip the
//! provider's secondary abuse limits, which no amount of tokens avoids.

use crate::driver::{DriverState, SearchDriver};
use crate::error::Result;
use crate::fetcher::ItemFetcher;
use crate::matcher::Matcher;
use crate::output::RecordSink;
use tracing::info;

/// Counters for one finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Results produced by the driver
    pub seen: u64,
    /// Results whose content matched
    pub matched: u64,
    /// Results whose content could not be fetched
    pub skipped: u64,
    /// How the driver finished
    pub outcome: DriverState,
}

/// Runs one query end to end.
pub struct Scanner {
    driver: SearchDriver,
    fetcher: ItemFetcher,
    matcher: Matcher,
    sink: RecordSink,
    matched_only: bool,
}

impl Scanner {
    /// Assemble a scanner.
    #[must_use]
    pub fn new(
        driver: SearchDriver,
        fetcher: ItemFetcher,
        matcher: Matcher,
        sink: RecordSink,
    ) -> Self {
        Self {
            driver,
            fetcher,
            matcher,
            sink,
            matched_only: false,
        }
    }

    /// Suppress the per-item "no match" log lines.
    #[must_use]
    pub fn matched_only(mut self, matched_only: bool) -> Self {
        self.matched_only = matched_only;
        self
    }

    /// Walk every result, fetch and scan it, and emit the matches.
    ///
    /// Unfetchable items are skipped; only output failures abort the scan.
    pub async fn run(mut self) -> Result<ScanSummary> {
        let mut matched = 0;
        let mut skipped = 0;

        while let Some(item) = self.driver.next().await {
            let Some(content) = self.fetcher.fetch(&item.url).await else {
                skipped += 1;
                continue;
            };

            match self.matcher.scan(&content) {
                Some(found) => {
                    info!(
                        url = %item.html_url,
                        matches = ?found.exact_match,
                        blocks = ?found.code_block,
                        "code block found"
                    );
                    let record = found.into_record(item);
                    self.sink.emit(&record)?;
                    matched += 1;
                }
                None if !self.matched_only => {
                    info!(url = %item.html_url, "no match");
                }
                None => {}
            }
        }

        let summary = ScanSummary {
            seen: self.driver.emitted(),
            matched,
            skipped,
            outcome: self.driver.state(),
        };
        info!(
            seen = summary.seen,
            matched = summary.matched,
            skipped = summary.skipped,
            outcome = ?summary.outcome,
            "scan finished"
        );
        Ok(summary)
    }
}
