use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{EventBus, QueryKey, Subscription};

/// Read-through cache for query results, invalidated by bus events
/// rather than by polling.
pub struct ViewCache<V> {
    entries: Mutex<HashMap<QueryKey, V>>,
    // Bumped on every invalidation so a load that raced a mutation is not stored
    generation: AtomicU64,
}

impl<V> Default for ViewCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }
}

impl<V: Clone + Send + 'static> ViewCache<V> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, V>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &QueryKey) -> Option<V> {
        self.entries().get(key).cloned()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries().contains_key(key)
    }

    pub async fn get_or_try_load<F, Fut, E>(&self, key: QueryKey, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            tracing::trace!("View cache hit for {:?}", key);
            return Ok(value);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = load().await?;

        let mut entries = self.entries();
        if self.generation.load(Ordering::Acquire) == generation {
            entries.insert(key, value.clone());
        } else {
            tracing::debug!("Skipped caching {:?}: invalidated while loading", key);
        }
        Ok(value)
    }

    pub fn invalidate(&self, keys: &[QueryKey]) {
        let mut entries = self.entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        for key in keys {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    /// Invalidate entries whenever an event on `bus` declares them stale
    #[must_use = "the cache stops invalidating once the subscription is dropped"]
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> Subscription {
        let cache = Arc::downgrade(self);
        bus.subscribe(move |event| {
            if let Some(cache) = cache.upgrade() {
                cache.invalidate(&event.invalidates());
            }
        })
    }
}
