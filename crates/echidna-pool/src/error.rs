use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no valid credentials ({rejected} rejected)")]
    NoValidCredentials { rejected: usize },
}
