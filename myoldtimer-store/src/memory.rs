use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::backend::{BoxFuture, KeyValueStore};
use crate::error::StoreResult;

/// Volatile store, used in tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw values, e.g. legacy records.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>> {
        Box::pin(async move { Ok(self.values.read().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a Value) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.values.write().await.insert(key.to_string(), value.clone());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.values.write().await.remove(key);
            Ok(())
        })
    }
}
