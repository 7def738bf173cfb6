// ── Deduplicating query cache ──
//
// Concurrent keyed storage built on `DashMap` + `watch` channels. The
// shard lock taken through `DashMap::entry` is the critical section that
// decides whether a read starts a fetch, so a key never has two fetches
// in flight. Fetches run as spawned tasks and publish their result back
// through the key's channel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::entry::{CacheEntry, QueryStatus};
use super::key::CacheKey;
use super::stream::QueryStream;
use crate::error::CoreError;

/// Base delay before the first read retry; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Per-read policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// When `false` the fetcher is never invoked.
    pub enabled: bool,
    /// How long a successful result is served without refetching.
    pub stale_time: Duration,
    /// Retries after a transient fetch failure.
    pub retry: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
            retry: 1,
        }
    }
}

impl ReadOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

/// One key's channel plus the generation it was created in. Eviction
/// drops the slot, so a late result from an older generation finds
/// nothing (or a newer slot) and is ignored.
struct Slot<T> {
    generation: u64,
    tx: watch::Sender<Arc<CacheEntry<T>>>,
}

struct CacheInner<T> {
    slots: DashMap<CacheKey, Slot<T>>,
    next_generation: AtomicU64,
}

/// What a read decided to do, taken under the key's shard lock.
enum ReadAction {
    Disabled,
    AttachInFlight,
    ServeCached,
    Fetch,
}

/// Keyed store of fetched results.
///
/// Cheaply cloneable; clones share the same entries.
pub struct QueryCache<T: Send + Sync + 'static> {
    inner: Arc<CacheInner<T>>,
}

impl<T: Send + Sync + 'static> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: DashMap::new(),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to `key`, fetching it when needed.
    ///
    /// - disabled: nothing runs; a new entry stays `Idle`.
    /// - a fetch is in flight: the caller attaches to it.
    /// - fresh data: served as is.
    /// - otherwise: the entry moves to `Loading` and `fetcher` runs on a
    ///   spawned task, settling to `Success` or `Error` (keeping old data).
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    pub fn read<F, Fut>(&self, key: CacheKey, fetcher: F, options: ReadOptions) -> QueryStream<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let slot = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| self.new_slot(&key));

        let current = Arc::clone(&slot.tx.borrow());
        let action = if !options.enabled {
            ReadAction::Disabled
        } else if current.status == QueryStatus::Loading {
            ReadAction::AttachInFlight
        } else if current.is_fresh(options.stale_time, Instant::now()) {
            ReadAction::ServeCached
        } else {
            ReadAction::Fetch
        };

        match action {
            ReadAction::Disabled => {
                trace!(%key, "read disabled, not fetching");
                if current.enabled {
                    update(&slot.tx, |e| e.enabled = false);
                }
                QueryStream::new(slot.tx.subscribe())
            }
            ReadAction::AttachInFlight => {
                trace!(%key, "attaching to in-flight fetch");
                QueryStream::new(slot.tx.subscribe())
            }
            ReadAction::ServeCached => {
                trace!(%key, "serving fresh cached data");
                QueryStream::new(slot.tx.subscribe())
            }
            ReadAction::Fetch => {
                let prior = current.status;
                let epoch = current.invalidations;
                let generation = slot.generation;
                update(&slot.tx, |e| {
                    e.status = QueryStatus::Loading;
                    e.enabled = true;
                });
                let stream = QueryStream::new(slot.tx.subscribe());
                drop(slot);

                debug!(%key, "fetch started");
                let cache = self.clone();
                tokio::spawn(async move {
                    let result = fetch_with_retry(&key, &fetcher, options.retry).await;
                    cache.settle(&key, generation, epoch, prior, result);
                });
                stream
            }
        }
    }

    /// [`read`](Self::read), then wait for the entry to settle.
    pub async fn fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetcher: F,
        options: ReadOptions,
    ) -> Arc<CacheEntry<T>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        self.read(key, fetcher, options).settled().await
    }

    /// Subscribe to `key` without fetching, recording why the read was
    /// refused on the entry's `error`.
    ///
    /// The entry drops back to a disabled `Idle` with no data, and a fetch
    /// still in flight for it is discarded when it settles.
    pub fn gate(&self, key: CacheKey, reason: CoreError) -> QueryStream<T> {
        let mut slot = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| self.new_slot(&key));
        trace!(%key, %reason, "read gated");
        slot.generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut gated = CacheEntry::idle(key);
        gated.enabled = false;
        gated.error = Some(Arc::new(reason));
        slot.tx.send_replace(Arc::new(gated));
        QueryStream::new(slot.tx.subscribe())
    }

    /// Mark every entry whose key starts with `prefix` as stale. Data is
    /// kept; the next enabled read refetches. Returns the number of
    /// entries touched.
    pub fn invalidate(&self, prefix: &CacheKey) -> usize {
        let now = Instant::now();
        let mut touched = 0;
        for slot in self.inner.slots.iter() {
            if slot.key().starts_with(prefix) {
                update(&slot.tx, |e| {
                    e.fetched_at = None;
                    e.invalidated_at = Some(now);
                    e.invalidations += 1;
                });
                touched += 1;
            }
        }
        debug!(%prefix, entries = touched, "invalidated");
        touched
    }

    /// Remove `key` entirely. A fetch still in flight for it is ignored
    /// when it settles. Returns `true` if the key existed.
    pub fn evict(&self, key: &CacheKey) -> bool {
        let removed = self.inner.slots.remove(key).is_some();
        if removed {
            debug!(%key, "evicted");
        }
        removed
    }

    /// Evict every entry.
    pub fn clear(&self) {
        let count = self.inner.slots.len();
        self.inner.slots.clear();
        debug!(entries = count, "cache cleared");
    }

    /// Current state of `key`, if it has ever been referenced.
    pub fn entry(&self, key: &CacheKey) -> Option<Arc<CacheEntry<T>>> {
        self.inner
            .slots
            .get(key)
            .map(|slot| Arc::clone(&slot.tx.borrow()))
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.inner.slots.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn new_slot(&self, key: &CacheKey) -> Slot<T> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, _) = watch::channel(Arc::new(CacheEntry::idle(key.clone())));
        Slot { generation, tx }
    }

    /// Apply a fetch result, unless the key was evicted or nobody is
    /// listening any more.
    fn settle(
        &self,
        key: &CacheKey,
        generation: u64,
        epoch: u64,
        prior: QueryStatus,
        result: Result<T, CoreError>,
    ) {
        let Some(slot) = self.inner.slots.get(key) else {
            debug!(%key, "key evicted, discarding fetch result");
            return;
        };
        if slot.generation != generation {
            debug!(%key, "key recreated, discarding fetch result");
            return;
        }
        if slot.tx.receiver_count() == 0 {
            debug!(%key, "no subscribers, discarding fetch result");
            update(&slot.tx, |e| e.status = prior);
            return;
        }

        let now = Instant::now();
        match result {
            Ok(data) => {
                update(&slot.tx, |e| {
                    e.status = QueryStatus::Success;
                    e.data = Some(Arc::new(data));
                    e.error = None;
                    e.updated_at = Some(Utc::now());
                    // Invalidated while in flight: keep the data, stay stale.
                    e.fetched_at = (e.invalidations == epoch).then_some(now);
                });
                debug!(%key, "fetch succeeded");
            }
            Err(err) => {
                warn!(%key, error = %err, "fetch failed");
                let err = Arc::new(err);
                update(&slot.tx, |e| {
                    e.status = QueryStatus::Error;
                    e.error = Some(err);
                });
            }
        }
    }
}

/// Publish a modified copy of the entry to every subscriber.
fn update<T>(tx: &watch::Sender<Arc<CacheEntry<T>>>, f: impl FnOnce(&mut CacheEntry<T>)) {
    tx.send_modify(|entry| {
        let mut next = CacheEntry::clone(entry);
        f(&mut next);
        *entry = Arc::new(next);
    });
}

async fn fetch_with_retry<T, F, Fut>(key: &CacheKey, fetcher: &F, retry: u32) -> Result<T, CoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(err) if attempt < retry && err.is_transient() => {
                attempt += 1;
                let delay = retry_delay(attempt);
                debug!(%key, attempt, ?delay, error = %err, "transient fetch failure, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    RETRY_BASE_DELAY.saturating_mul(factor).min(RETRY_MAX_DELAY)
}
