//! In-process key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{item_key, Item, KeyValueStore, StoreError};

/// A [`KeyValueStore`] held in process memory.
///
/// Items do not survive a restart. Useful for tests and for
/// `STORE_BACKEND=memory` development runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        let key = item_key(&item)?.to_string();
        self.items.write().await.insert(key, item);
        Ok(())
    }
}
