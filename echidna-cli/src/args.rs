use anyhow::{bail, Context, Result};
use clap::Parser;
use echidna_core::Credential;
use std::fs;
use std::path::{Path, PathBuf};

/// Search public code for a query and scan every hit for a pattern.
#[derive(Debug, Parser)]
#[command(name = "echidna", author, version, about, long_about = None)]
pub struct Cli {
    /// Code search query (supports qualifiers such as language: or repo:)
    #[arg(short = 'q', long)]
    pub query: String,

    /// Regular expression to look for in each result's content
    #[arg(short = 'p', long)]
    pub pattern: String,

    /// API tokens, comma separated
    #[arg(short = 't', long = "token", value_delimiter = ',')]
    pub tokens: Vec<String>,

    /// File with one API token per line
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Append matches to this file, one JSON record per line
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Do not ask before paging through large result sets
    #[arg(long)]
    pub no_prompt: bool,

    /// Start with the oldest results (only reaches the oldest ceiling's worth)
    #[arg(long)]
    pub reverse_order: bool,

    /// Only log items whose content matched
    #[arg(long)]
    pub matched_only: bool,

    /// Result page to start from
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: u32,

    /// Also print match records to stdout
    #[arg(long)]
    pub json: bool,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Gather tokens from `--token` and `--token-file`.
    pub fn credentials(&self) -> Result<Vec<Credential>> {
        if self.tokens.is_empty() && self.token_file.is_none() {
            bail!("no tokens given, use --token or --token-file");
        }

        let mut raw: Vec<String> = self.tokens.clone();
        if let Some(path) = &self.token_file {
            raw.extend(read_token_file(path)?);
        }
        parse_tokens(raw)
    }
}

fn read_token_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read token file {}", path.display()))?;
    Ok(contents.lines().map(str::to_string).collect())
}

/// Turn raw token strings into credentials, skipping blank entries.
fn parse_tokens(raw: Vec<String>) -> Result<Vec<Credential>> {
    let credentials = raw
        .into_iter()
        .filter(|token| !token.trim().is_empty())
        .map(|token| Credential::new(token).context("malformed token"))
        .collect::<Result<Vec<_>>>()?;

    if credentials.is_empty() {
        bail!("no tokens given, the token list is empty");
    }
    Ok(credentials)
}
