use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid match pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
