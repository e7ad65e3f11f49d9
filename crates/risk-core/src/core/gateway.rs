//! Fetch gateway: TTL cache plus request coalescing, keyed by request URL.
//!
//! One gateway is built per process (or per test) and injected into the data
//! service. It is the only owner of the cache and of the in-flight map.
//!
//! For a given key:
//!   - a cached entry younger than the TTL is returned without any I/O
//!     (only when `cache` is enabled for the call);
//!   - a fetch already in flight is shared with every later caller, cached
//!     or not, so at most one outbound request per key runs at a time;
//!   - otherwise the fetcher runs, and its pending result is registered
//!     before the first suspension point.
//!
//! Successful results replace the cache entry; failures are handed to every
//! waiting caller and never cached.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::fetched::Fetched;
use crate::constants::DEFAULT_CACHE_TTL;
use crate::errors::RiskDataError;

type PendingFetch<T> = Shared<BoxFuture<'static, Result<T, RiskDataError>>>;

// ═══════════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub cache: bool,
    pub ttl: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache: true,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl FetchOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { cache: true, ttl }
    }

    pub fn uncached() -> Self {
        Self {
            cache: false,
            ..Self::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════════

struct CacheEntry<T> {
    data: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            fetched_at: Instant::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

struct GatewayState<T> {
    cache: LruCache<String, CacheEntry<T>>,
    in_flight: HashMap<String, PendingFetch<T>>,
}

fn lock<T>(state: &Mutex<GatewayState<T>>) -> MutexGuard<'_, GatewayState<T>> {
    // Every critical section leaves the state consistent, so a panic
    // elsewhere cannot corrupt it.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ═══════════════════════════════════════════════════════════════════════════
// FetchGateway
// ═══════════════════════════════════════════════════════════════════════════

pub struct FetchGateway<T> {
    state: Arc<Mutex<GatewayState<T>>>,
}

impl<T> FetchGateway<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cache bounded to `max_entries`, least recently used evicted first.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(GatewayState {
                cache: LruCache::new(capacity),
                in_flight: HashMap::new(),
            })),
        }
    }

    /// Resolve `key` from cache, from an in-flight request, or by running
    /// `fetcher`. `fetcher` is only called when a new request is needed.
    pub async fn get<F, Fut>(
        &self,
        key: &str,
        options: FetchOptions,
        fetcher: F,
    ) -> Result<T, RiskDataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskDataError>> + Send + 'static,
    {
        let pending = {
            let mut state = lock(&self.state);

            if options.cache {
                if let Some(entry) = state.cache.get(key) {
                    if !entry.is_stale(options.ttl) {
                        trace!(key, "cache hit");
                        return Ok(entry.data.clone());
                    }
                }
            }

            match state.in_flight.get(key) {
                Some(pending) => {
                    trace!(key, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    debug!(key, cache = options.cache, "fetching");
                    let pending = self.settle(key.to_string(), fetcher()).boxed().shared();
                    state.in_flight.insert(key.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Like [`get`](Self::get), but never fails: a failed fetch falls back to
    /// the last cached value for the key, however old.
    pub async fn resolve<F, Fut>(&self, key: &str, options: FetchOptions, fetcher: F) -> Fetched<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RiskDataError>> + Send + 'static,
    {
        match self.get(key, options, fetcher).await {
            Ok(data) => Fetched::Fresh(data),
            Err(error) => match self.peek(key) {
                Some(data) => {
                    debug!(key, %error, "fetch failed, serving stale entry");
                    Fetched::Stale { data, error }
                }
                None => {
                    debug!(key, %error, "fetch failed, nothing cached");
                    Fetched::Unavailable { error }
                }
            },
        }
    }

    /// Wrap the fetch so that its completion updates the shared state exactly
    /// once, whichever caller happens to drive it.
    fn settle<Fut>(
        &self,
        key: String,
        fetch: Fut,
    ) -> impl Future<Output = Result<T, RiskDataError>> + Send + 'static
    where
        Fut: Future<Output = Result<T, RiskDataError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        async move {
            let result = fetch.await;
            let mut state = lock(&state);
            state.in_flight.remove(&key);
            if let Ok(data) = &result {
                state.cache.put(key, CacheEntry::new(data.clone()));
            }
            result
        }
    }

    /// Last cached value for `key`, ignoring its age.
    pub fn peek(&self, key: &str) -> Option<T> {
        lock(&self.state).cache.peek(key).map(|e| e.data.clone())
    }

    /// Drop one entry, or every entry when `key` is `None`. Requests already
    /// in flight are unaffected and will still populate the cache.
    pub fn clear(&self, key: Option<&str>) {
        let mut state = lock(&self.state);
        match key {
            Some(key) => {
                state.cache.pop(key);
            }
            None => state.cache.clear(),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.state).cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.state).in_flight.len()
    }
}
