//! Read-through caches for precomputed page fragments.
//!
//! Entries are never invalidated explicitly; they age out after their time-to-live.
//! A failed load is not cached, so the next request retries the store.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

/// Upper bound on entries per fragment cache; each holds a handful of keys.
const FRAGMENT_CAPACITY: u64 = 64;

pub fn fragment_cache<K, V>(ttl: Duration) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(FRAGMENT_CAPACITY)
        .build()
}

/// Recovers the loader error that `try_get_with` shares between waiting callers.
pub fn loader_error<E: Clone>(err: Arc<E>) -> E {
    Arc::unwrap_or_clone(err)
}
