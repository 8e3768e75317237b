//! Credential storage.
//!
//! The durable store is an external key-value service reached through the
//! narrow [`KeyValueStore`] interface: `get` an item by key, `put` an item
//! keyed by its `id` attribute. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process memory, for tests and throwaway deployments
//! - [`FileStore`]: one JSON document per key on local disk
//!
//! [`SessionStore`] is the typed gateway the flow and proxy use. It maps
//! [`Session`] and [`PendingAuthorization`] records to items and back, and
//! performs exactly one store round trip per call. There is no cache.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::session::{PendingAuthorization, Session};
use crate::config::ShopDomain;

/// A stored item: a JSON object whose `id` attribute is its key.
pub type Item = Map<String, Value>;

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing service failed (I/O, network, throttling).
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Backend diagnostic.
        message: String,
    },

    /// The key contains characters the backend cannot address.
    #[error("Invalid store key '{key}'")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// An item was written without a string `id` attribute.
    #[error("Item has no string 'id' attribute")]
    MissingKey,

    /// A stored item could not be decoded.
    #[error("Corrupt record '{key}': {message}")]
    Corrupt {
        /// Key of the unreadable item.
        key: String,
        /// Decoder diagnostic.
        message: String,
    },
}

/// GET/PUT-by-key access to the durable store.
///
/// `put` is an unconditional upsert: the last writer wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the item stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// Inserts or replaces the item keyed by its `id` attribute.
    async fn put(&self, item: Item) -> Result<(), StoreError>;
}

/// Returns the `id` attribute of an item.
///
/// # Errors
///
/// Returns [`StoreError::MissingKey`] when `id` is absent or not a string.
pub fn item_key(item: &Item) -> Result<&str, StoreError> {
    item.get("id")
        .and_then(Value::as_str)
        .ok_or(StoreError::MissingKey)
}

/// Checks that `key` is usable as a store key.
///
/// Keys are non-empty, use only `[A-Za-z0-9_.-]`, and do not start with `.`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] otherwise.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Typed access to session and pending-authorization records.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use shopify_app_gateway::{MemoryStore, Session, SessionStore, ShopDomain};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = SessionStore::new(Arc::new(MemoryStore::new()));
/// let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
///
/// assert!(store.get_session(&shop).await.unwrap().is_none());
///
/// let session = Session::offline(shop.clone(), "tok".to_string(), String::new());
/// store.put_session(&session).await.unwrap();
/// assert!(store.get_session(&shop).await.unwrap().unwrap().is_active());
/// # }
/// ```
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Wraps a key-value store.
    #[must_use]
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Reads the offline session of `shop`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store fails or the record is corrupt.
    /// An absent record is `Ok(None)`, never an error.
    pub async fn get_session(&self, shop: &ShopDomain) -> Result<Option<Session>, StoreError> {
        self.get_record(&shop.offline_session_id()).await
    }

    /// Upserts `session` under its id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store fails.
    pub async fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        self.put_record(&session.id, session).await
    }

    /// Reads the pending authorization of `shop`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store fails or the record is corrupt.
    pub async fn get_authorization(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<PendingAuthorization>, StoreError> {
        self.get_record(&PendingAuthorization::key_for(shop)).await
    }

    /// Upserts a pending authorization.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store fails.
    pub async fn put_authorization(
        &self,
        pending: &PendingAuthorization,
    ) -> Result<(), StoreError> {
        self.put_record(&pending.id, pending).await
    }

    async fn get_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(item) = self.inner.get(key).await? else {
            tracing::debug!(key, "record not found");
            return Ok(None);
        };

        serde_json::from_value(Value::Object(item))
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn put_record<T: Serialize>(&self, key: &str, record: &T) -> Result<(), StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            key: key.to_string(),
            message,
        };

        let item = match serde_json::to_value(record) {
            Ok(Value::Object(item)) => item,
            Ok(other) => return Err(corrupt(format!("expected an object, got {other}"))),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        self.inner.put(item).await?;
        tracing::debug!(key, "record written");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
