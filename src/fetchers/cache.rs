//! Time-bounded memoization for fetcher results.
//!
//! Wraps a `moka` cache with a fixed time-to-live. Only completed results
//! are stored: two identical calls that miss at the same time both run
//! their fetch.

use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tracing::debug;

/// Per-function result cache keyed by the function's arguments.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    name: &'static str,
    cache: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache whose entries expire `ttl` after insertion.
    ///
    /// `name` only shows up in logs.
    #[must_use]
    pub fn new(name: &'static str, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { name, cache }
    }

    /// Returns the cached value for `key`, or runs `fetch` and stores its result.
    ///
    /// `fetch` returning `Ok(None)` means "no result": nothing is stored and
    /// the next call fetches again. Errors are passed through and never cached.
    ///
    /// # Errors
    ///
    /// Returns whatever error `fetch` returns.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.cache.get(&key).await {
            debug!(cache = self.name, "Cache hit");
            return Ok(Some(value));
        }

        debug!(cache = self.name, "Cache miss");
        let fetched = fetch().await?;
        if let Some(value) = &fetched {
            self.cache.insert(key, value.clone()).await;
        }
        Ok(fetched)
    }

    /// Returns the current number of entries in the cache
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
