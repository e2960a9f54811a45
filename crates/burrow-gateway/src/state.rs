use std::sync::Arc;

use burrow_core::{ShortToken, Storage};
use burrow_generator::Generator;

#[derive(Clone)]
pub struct AppState {
    storage: Arc<dyn Storage>,
    generator: Arc<dyn Generator>,
    base_url: Arc<str>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        generator: Arc<dyn Generator>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            generator,
            base_url: Arc::from(base_url.into()),
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Generator used for fresh owner ids.
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn short_url(&self, token: &ShortToken) -> String {
        token.to_url(&self.base_url)
    }
}
