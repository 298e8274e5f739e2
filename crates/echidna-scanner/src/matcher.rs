//! Pattern matching over fetched content.

use crate::error::Result;
use echidna_core::{MatchRecord, ResultDescriptor};
use regex::Regex;
use std::collections::BTreeSet;

/// Matches found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    /// Distinct exact matches
    pub exact_match: BTreeSet<String>,
    /// Distinct lines containing a match
    pub code_block: BTreeSet<String>,
}

impl MatchSet {
    /// Attach the matches to the item they were found in.
    #[must_use]
    pub fn into_record(self, item: ResultDescriptor) -> MatchRecord {
        MatchRecord {
            item,
            exact_match: self.exact_match,
            code_block: self.code_block,
        }
    }
}

/// Compiled user pattern.
///
/// Capturing groups in the pattern are allowed but ignored: matches are
/// always whole-pattern matches.
#[derive(Debug, Clone)]
pub struct Matcher {
    exact: Regex,
    line: Regex,
}

impl Matcher {
    /// Compile `pattern`.
    ///
    /// # Errors
    /// Returns `ScanError::InvalidPattern` if the pattern is not a valid
    /// regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            exact: Regex::new(pattern)?,
            line: Regex::new(&format!(".*(?:{pattern}).*"))?,
        })
    }

    /// The pattern as given.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.exact.as_str()
    }

    /// Scan `content`. Returns `None` if the pattern does not match.
    ///
    /// Empty matches do not count.
    #[must_use]
    pub fn scan(&self, content: &str) -> Option<MatchSet> {
        let exact_match: BTreeSet<String> = self
            .exact
            .find_iter(content)
            .map(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        if exact_match.is_empty() {
            return None;
        }

        let code_block = self
            .line
            .find_iter(content)
            .map(|m| m.as_str().trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Some(MatchSet {
            exact_match,
            code_block,
        })
    }
}
