use async_trait::async_trait;
use burrow_core::storage::Result;
use burrow_core::{LinkRecord, LinkStatus, ShortToken, Storage, StorageError};
use burrow_generator::{Generator, RandomGenerator};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<ShortToken, LinkRecord>,
    /// Live records only, keyed by original URL.
    live_urls: HashMap<String, ShortToken>,
}

/// In-memory implementation of the [`Storage`] trait.
///
/// Records and the URL index sit behind one mutex so the duplicate check and
/// the insert happen atomically. Nothing survives a restart.
#[derive(Debug)]
pub struct MemoryStore<G = RandomGenerator> {
    inner: Mutex<Inner>,
    generator: G,
}

impl MemoryStore<RandomGenerator> {
    /// Creates an empty store using the random token generator.
    pub fn new() -> Self {
        Self::with_generator(RandomGenerator::new())
    }
}

impl Default for MemoryStore<RandomGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Generator> MemoryStore<G> {
    pub fn with_generator(generator: G) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            generator,
        }
    }

    /// Number of records held, deleted ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<G: Generator> Storage for MemoryStore<G> {
    async fn get(&self, token: &ShortToken) -> Result<String> {
        let inner = self.inner.lock();

        let Some(record) = inner.records.get(token) else {
            return Err(StorageError::NotFound(token.clone()));
        };

        if record.is_deleted() {
            return Err(StorageError::Gone(token.clone()));
        }

        Ok(record.original_url.clone())
    }

    async fn add(&self, original_url: &str, owner_id: &str) -> Result<ShortToken> {
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.live_urls.get(original_url) {
            return Err(StorageError::DuplicateUrl(existing.clone()));
        }

        let token = self.generator.generate();
        inner
            .live_urls
            .insert(original_url.to_owned(), token.clone());
        inner.records.insert(
            token.clone(),
            LinkRecord::new(token.clone(), original_url, owner_id),
        );

        debug!(token = %token, owner_id, "link added");
        Ok(token)
    }

    async fn items_of_user(&self, owner_id: &str) -> Result<Vec<LinkRecord>> {
        let inner = self.inner.lock();

        Ok(inner
            .records
            .values()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, tokens: &[ShortToken], owner_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let Inner { records, live_urls } = &mut *inner;

        for token in tokens {
            let Some(record) = records.get_mut(token) else {
                continue;
            };
            if record.owner_id != owner_id || record.is_deleted() {
                continue;
            }

            record.status = LinkStatus::Deleted;
            live_urls.remove(&record.original_url);
            debug!(token = %token, owner_id, "link deleted");
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
