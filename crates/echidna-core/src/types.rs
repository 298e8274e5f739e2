//! Shared types used across Echidna.
//!
//! This module defines the credential newtypes and the records that flow
//! from the search driver through the fetcher and matcher to the output.

use crate::error::EchidnaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An API access token.
///
/// The secret is wiped from memory when dropped. `Display` and `Debug` only
/// ever show a redacted form; use [`Credential::expose`] to build headers.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Create a credential from a raw token string.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns error if the token is empty or contains inner whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, EchidnaError> {
        let token = token.into();
        let trimmed = token.trim();

        if trimmed.is_empty() {
            return Err(EchidnaError::Validation("empty token".to_string()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EchidnaError::Validation(
                "token must not contain whitespace".to_string(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the raw secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Redacted form for logs: keeps the first and last four characters of
    /// long tokens, hides short ones entirely.
    #[must_use]
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

/// The identity a request is made under.
///
/// Anonymous requests have their own (small) quota and are throttled and
/// recovered exactly like tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// An authenticated token
    Token(Credential),
    /// Unauthenticated access
    Anonymous,
}

impl Identity {
    /// The credential to authenticate with, if any.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Token(credential) => Some(credential),
            Self::Anonymous => None,
        }
    }
}

impl From<Credential> for Identity {
    fn from(credential: Credential) -> Self {
        Self::Token(credential)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(credential) => write!(f, "{credential}"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Sort direction of a search sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

impl SortOrder {
    /// Query-string value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search hit, as produced by the search driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    /// File path inside the repository
    pub path: String,
    /// API URL of the file (also its identity)
    pub url: String,
    /// Browsable URL
    pub html_url: String,
    /// Login of the repository owner
    pub owner_login: String,
    /// Repository name
    pub repo: String,
}

/// A search hit whose content matched the user pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// The hit itself
    #[serde(flatten)]
    pub item: ResultDescriptor,
    /// Distinct exact matches
    pub exact_match: BTreeSet<String>,
    /// Distinct lines containing a match
    pub code_block: BTreeSet<String>,
}
