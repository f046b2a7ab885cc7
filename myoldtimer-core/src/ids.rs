//! Record identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Produces an identifier that is unique within the process lifetime.
pub trait IdGenerator {
    fn next_id(&self, prefix: &str) -> String;
}

/// `{prefix}-{unix_millis}-{counter}` identifiers.
#[derive(Debug, Default)]
pub struct PrefixedIds {
    counter: AtomicU64,
}

impl PrefixedIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for PrefixedIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), n)
    }
}

/// Deterministic `{prefix}-{n}` identifiers, starting at 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }
}
