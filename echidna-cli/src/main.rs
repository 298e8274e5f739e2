//! `echidna` binary: search public code and scan every hit for a pattern.

mod args;

use anyhow::{bail, Context, Result};
use args::Cli;
use clap::Parser;
use echidna_core::AppConfig;
use echidna_github::{CodeSearchApi, GitHubClient};
use echidna_pool::{CredentialPool, ThrottleMonitor};
use echidna_scanner::{
    ConfirmFn, DriverState, ItemFetcher, Matcher, RecordSink, Scanner, SearchCursor, SearchDriver,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Ask on the terminal whether to page through `total` results.
fn prompt_confirm() -> ConfirmFn {
    Box::new(|total| {
        tokio::task::block_in_place(|| {
            eprint!("Over {total} results, continue? [Y/N] ");
            let _ = io::stderr().flush();
            let mut answer = String::new();
            if io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            answer.trim().eq_ignore_ascii_case("y")
        })
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting echidna v{}", env!("CARGO_PKG_VERSION"));

    let candidates = cli.credentials()?;
    let matcher = Matcher::new(&cli.pattern).context("invalid --pattern")?;
    let config =
        AppConfig::load_with_env(cli.config.as_deref()).context("failed to load configuration")?;

    let client = GitHubClient::new(&config.api).context("failed to build HTTP client")?;
    let api: Arc<dyn CodeSearchApi> = Arc::new(client);

    let pool = CredentialPool::validate_all(api.as_ref(), candidates)
        .await
        .context("token validation failed")?;

    let monitor = ThrottleMonitor::new(pool.clone(), api.clone(), config.throttle.monitor_interval());
    let monitor_handle = monitor.spawn();

    let cursor = if cli.reverse_order {
        SearchCursor::reversed(cli.query.as_str(), cli.start_page)
    } else {
        SearchCursor::new(cli.query.as_str(), cli.start_page)
    };
    let backoff = config.throttle.backoff();

    let mut driver = SearchDriver::new(
        api.clone(),
        pool.clone(),
        config.search.clone(),
        backoff,
        cursor,
    );
    if !cli.no_prompt {
        driver = driver.with_confirmation(prompt_confirm());
    }

    let fetcher = ItemFetcher::new(api, pool, backoff);
    let sink = RecordSink::new(cli.output_file.as_deref(), cli.json)
        .context("failed to open output file")?;

    let summary = Scanner::new(driver, fetcher, matcher, sink)
        .matched_only(cli.matched_only)
        .run()
        .await
        .context("scan aborted")?;

    monitor_handle.abort();

    match summary.outcome {
        DriverState::Declined => info!("not continuing, exiting"),
        DriverState::Failed => bail!("search stopped on an unexpected API response"),
        _ => {}
    }
    Ok(())
}
