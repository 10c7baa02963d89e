//! Shared query cache.
//!
//! # Design
//! Keys are endpoint plus query (`client::cache_key`), values are the last
//! successful payload for that key, type-erased so one cache serves every
//! resource. Queries bound to the same cache show each other's results
//! immediately while they revalidate. Mutations drop stale keys by prefix;
//! every dropped key is broadcast to `subscribe`rs so screens can refetch.

use std::any::Any;
use std::sync::Arc;

use moka::sync::Cache;
use tokio::sync::broadcast;

const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<String, Entry>,
    invalidations: broadcast::Sender<String>,
}

impl QueryCache {
    pub fn new(capacity: u64) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: Cache::new(capacity),
            invalidations,
        }
    }

    /// Cached payload for `key`, if present and stored as a `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| entry.downcast_ref::<T>().cloned())
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        self.entries.insert(key.to_string(), Arc::new(value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
        self.notify(key);
    }

    /// Drop every key starting with `prefix`; returns how many went.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let stale: Vec<Arc<String>> = self
            .entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(prefix))
            .collect();
        for key in &stale {
            self.entries.invalidate(key.as_str());
            self.notify(key);
        }
        tracing::debug!(prefix, dropped = stale.len(), "invalidated cached queries");
        stale.len()
    }

    /// Receiver for keys dropped from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.invalidations.subscribe()
    }

    fn notify(&self, key: &str) {
        // No subscribers is fine.
        let _ = self.invalidations.send(key.to_string());
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
