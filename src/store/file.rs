//! Durable key-value store on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{item_key, validate_key, Item, KeyValueStore, StoreError};

/// A [`KeyValueStore`] keeping each item as `<root>/<table>/<key>.json`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader sees either the old or the new document, never a
/// partial one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) the table directory `root/table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for an unusable table name and
    /// [`StoreError::Unavailable`] if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>, table: &str) -> Result<Self, StoreError> {
        validate_key(table)?;
        let dir = root.as_ref().join(table);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, &e))?;
        tracing::info!(dir = %dir.display(), "file store opened");
        Ok(Self { dir })
    }

    /// Returns the table directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StoreError {
    StoreError::Unavailable {
        message: format!("{}: {err}", path.display()),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError> {
        let path = self.path_for(key)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, &e)),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(item)) => Ok(Some(item)),
            Ok(_) => Err(StoreError::Corrupt {
                key: key.to_string(),
                message: "document is not a JSON object".to_string(),
            }),
            Err(e) => Err(StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        let key = item_key(&item)?;
        let path = self.path_for(key)?;

        let body = serde_json::to_vec_pretty(&item).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // Leading dot keeps temp files out of the key namespace
        let temp = self
            .dir
            .join(format!(".{key}.{}.tmp", hex::encode(rand::random::<[u8; 8]>())));

        if let Err(e) = tokio::fs::write(&temp, &body).await {
            return Err(io_error(&temp, &e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(&path, &e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, value: &str) -> Item {
        json!({ "id": id, "value": value })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_table_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        assert!(store.dir().is_dir());
        assert!(store.dir().ends_with("sessions"));
    }

    #[tokio::test]
    async fn test_open_rejects_bad_table_name() {
        let root = tempfile::tempdir().unwrap();
        let result = FileStore::open(root.path(), "../escape").await;
        assert!(matches!(result, Err(StoreError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn test_put_then_get_persists_across_instances() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        store
            .put(item("offline_a.myshopify.com", "one"))
            .await
            .unwrap();

        let reopened = FileStore::open(root.path(), "sessions").await.unwrap();
        let stored = reopened
            .get("offline_a.myshopify.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["value"], "one");
        assert!(store.dir().join("offline_a.myshopify.com.json").is_file());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_leaves_no_temp_files() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        store.put(item("k", "one")).await.unwrap();
        store.put(item("k", "two")).await.unwrap();

        let stored = store.get("k").await.unwrap().unwrap();
        assert_eq!(stored["value"], "two");

        let entries: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["k.json".to_string()]);
    }

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_rejects_path_traversal_key() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        let result = store.get("../../etc/passwd").await;
        assert!(matches!(result, Err(StoreError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn test_get_reports_corrupt_document() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::open(root.path(), "sessions").await.unwrap();
        std::fs::write(store.dir().join("bad.json"), b"{not json").unwrap();
        std::fs::write(store.dir().join("list.json"), b"[1,2]").unwrap();

        assert!(matches!(
            store.get("bad").await,
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            store.get("list").await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
