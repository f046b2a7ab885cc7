//! JSON-file store: one `<key>.json` document per key under a data directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{BoxFuture, KeyValueStore};
use crate::error::{StoreError, StoreResult};
use crate::keys::is_valid_key;

/// On-disk envelope, mirroring the `{key, value, updatedAt}` records of the device store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    key: String,
    value: Value,
    updated_at: String,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for JsonFileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(io_error(&path)(e)),
            };
            let record: StoredRecord = serde_json::from_slice(&bytes)?;
            Ok(Some(record.value))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a Value) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(io_error(&self.dir))?;

            let record = StoredRecord {
                key: key.to_string(),
                value: value.clone(),
                updated_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            };
            let json = serde_json::to_vec_pretty(&record)?;

            // Write-then-rename keeps the previous document intact if the write fails.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
            tokio::fs::rename(&tmp, &path).await.map_err(io_error(&path))?;
            log::debug!("stored {key} at {}", path.display());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(&path)(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        assert_eq!(store.get("checklistData").await.unwrap(), None);
        store.delete("checklistData").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let err = store.set("../escape", &json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_envelope_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.set("maintenanceCurrentMileage", &json!(81500)).await.unwrap();

        let path = dir.path().join("maintenanceCurrentMileage.json");
        let raw = std::fs::read_to_string(path).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["key"], "maintenanceCurrentMileage");
        assert_eq!(doc["value"], 81500);
        assert!(doc["updatedAt"].is_string());
        assert!(!dir.path().join("maintenanceCurrentMileage.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("replaceHistory.json"), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        let err = store.get("replaceHistory").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
