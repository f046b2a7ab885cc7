//! Key-value store abstraction.
//!
//! Single-key operations only: there are no transactions spanning keys, and
//! writes to one key are ordered only if the caller awaits each before the next.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::StoreResult;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Asynchronous string-keyed JSON store with last-write-wins semantics.
pub trait KeyValueStore: Send + Sync {
    /// The stored value, or `None` when the key has never been written.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Value>>>;

    fn set<'a>(&'a self, key: &'a str, value: &'a Value) -> BoxFuture<'a, StoreResult<()>>;

    /// Deleting a missing key succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>>;

    /// [`KeyValueStore::get`], substituting `fallback` for a missing key.
    fn get_or<'a>(&'a self, key: &'a str, fallback: Value) -> BoxFuture<'a, StoreResult<Value>> {
        Box::pin(async move { Ok(self.get(key).await?.unwrap_or(fallback)) })
    }
}
