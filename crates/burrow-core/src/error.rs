use crate::token::ShortToken;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short token: {0}")]
    InvalidShortToken(String),
    #[error("invalid link status: {0}")]
    InvalidStatus(String),
}

/// Errors returned by [`Storage`](crate::Storage) implementations.
///
/// `NotFound`, `Gone` and `DuplicateUrl` describe the state of a link and are
/// part of the normal contract. Every other variant is an internal failure of
/// the backing medium.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short token not found: {0}")]
    NotFound(ShortToken),
    #[error("short token has been deleted: {0}")]
    Gone(ShortToken),
    /// The URL is already shortened; carries the token of the live record.
    #[error("url is already shortened as {0}")]
    DuplicateUrl(ShortToken),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage io failed: {0}")]
    Io(String),
}

impl StorageError {
    /// Returns `true` for failures of the backing medium rather than of the
    /// requested link.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            StorageError::NotFound(_) | StorageError::Gone(_) | StorageError::DuplicateUrl(_)
        )
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
