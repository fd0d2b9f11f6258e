//! Named static assets (logos, icons) resolved to URLs.

use em_core::FxHashMap;
use parking_lot::RwLock;

/// A thread-safe map from asset name to URL.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: RwLock<FxHashMap<String, String>>,
}

impl AssetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with `entries`.
    pub fn init(&self, entries: impl IntoIterator<Item = (String, String)>) {
        *self.assets.write() = entries.into_iter().collect();
    }

    /// Returns the URL for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.assets.read().get(name).cloned()
    }

    /// Removes every asset.
    pub fn clear(&self) {
        self.assets.write().clear();
    }

    /// Returns the number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    /// Returns `true` if no asset is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}
