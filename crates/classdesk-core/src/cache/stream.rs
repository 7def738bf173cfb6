// ── Query subscriptions ──
//
// Handle vended by `QueryCache::read`. Holding it keeps the key
// "observed": a fetch that settles after every handle is dropped is
// discarded instead of being applied.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::entry::{CacheEntry, QueryStatus};

/// A subscription to one cache entry.
///
/// Provides point-in-time access to the entry and reactive change
/// notification via [`changed()`](Self::changed), [`settled()`](Self::settled)
/// or by converting to a `Stream`.
pub struct QueryStream<T: Send + Sync + 'static> {
    current: Arc<CacheEntry<T>>,
    receiver: watch::Receiver<Arc<CacheEntry<T>>>,
}

impl<T: Send + Sync + 'static> QueryStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<CacheEntry<T>>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The entry as it was when the handle was created or last advanced.
    pub fn current(&self) -> &Arc<CacheEntry<T>> {
        &self.current
    }

    /// The latest entry (may have changed since creation).
    pub fn latest(&self) -> Arc<CacheEntry<T>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next transition, returning the new entry.
    /// Returns `None` once the entry has been evicted.
    pub async fn changed(&mut self) -> Option<Arc<CacheEntry<T>>> {
        self.receiver.changed().await.ok()?;
        let entry = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&entry);
        Some(entry)
    }

    /// Wait until no fetch is in flight and return the entry.
    ///
    /// If the entry is evicted mid-flight the last published state
    /// (still `Loading`) is returned.
    pub async fn settled(&mut self) -> Arc<CacheEntry<T>> {
        loop {
            let entry = self.receiver.borrow_and_update().clone();
            if entry.status != QueryStatus::Loading {
                self.current = Arc::clone(&entry);
                return entry;
            }
            if self.receiver.changed().await.is_err() {
                self.current = entry;
                return Arc::clone(&self.current);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> QueryWatchStream<T> {
        QueryWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current entry first, then a new one on every transition.
pub struct QueryWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<CacheEntry<T>>>,
}

impl<T: Send + Sync + 'static> Stream for QueryWatchStream<T> {
    type Item = Arc<CacheEntry<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
