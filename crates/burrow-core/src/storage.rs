use crate::error::StorageError;
use crate::record::LinkRecord;
use crate::token::ShortToken;
use async_trait::async_trait;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The contract shared by every link storage backend.
///
/// Implementations own their persistence medium and must be safe to call
/// concurrently from many request handlers.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Resolves a token to its original URL.
    ///
    /// Returns `Err(NotFound)` if no record has this token and `Err(Gone)` if
    /// the record was deleted.
    async fn get(&self, token: &ShortToken) -> Result<String>;

    /// Shortens `original_url` on behalf of `owner_id`.
    ///
    /// If a live record already holds the same URL, no record is created and
    /// `Err(DuplicateUrl)` carries the existing token.
    async fn add(&self, original_url: &str, owner_id: &str) -> Result<ShortToken>;

    /// Lists every record created by `owner_id`, deleted ones included.
    /// The order is unspecified.
    async fn items_of_user(&self, owner_id: &str) -> Result<Vec<LinkRecord>>;

    /// Marks the records in `tokens` that belong to `owner_id` as deleted.
    ///
    /// Tokens that are unknown or owned by someone else are skipped silently.
    async fn delete(&self, tokens: &[ShortToken], owner_id: &str) -> Result<()>;

    /// Checks that the backing medium is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Short name of the backend, used in logs.
    fn backend_name(&self) -> &'static str;
}
