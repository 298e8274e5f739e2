//! Error types for API calls.

use thiserror::Error;

/// Errors that can occur while talking to the code search API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The identity's quota is exhausted
    #[error("rate limit exceeded: status {status}, {message}")]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The search endpoint refused a page past its own limit
    #[error("page out of range: {message}")]
    PageOutOfRange {
        /// Response body
        message: String,
    },

    /// Any other non-success response
    #[error("unexpected response: status {status}, {body}")]
    Unexpected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response parsing error
    #[error("failed to parse response from {endpoint}: {message}")]
    Parse {
        /// Endpoint name
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Classify a non-success response.
    ///
    /// 403 or 429 with "limit" in the body is throttling, 422 is the search
    /// endpoint's out-of-range page, anything else is unexpected.
    #[must_use]
    pub fn classify(status: u16, body: String) -> Self {
        match status {
            403 | 429 if body.to_ascii_lowercase().contains("limit") => Self::RateLimited {
                status,
                message: body,
            },
            422 => Self::PageOutOfRange { message: body },
            _ => Self::Unexpected { status, body },
        }
    }

    /// Whether the caller should throttle the identity and retry elsewhere.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// HTTP status code, when the error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::PageOutOfRange { .. } => Some(422),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Parse { .. } | Self::Internal(_) => None,
        }
    }
}

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
