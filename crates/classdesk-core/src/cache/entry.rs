// ── Cache entry state ──

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::key::CacheKey;
use crate::error::CoreError;

/// Fetch lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    /// Never fetched, or fetching is disabled.
    Idle,
    /// A fetch is in flight.
    Loading,
    Success,
    Error,
}

/// Point-in-time state of one cached read.
///
/// Entries are immutable snapshots; every transition publishes a new one.
/// `data` survives errors and invalidations so consumers can keep showing
/// the last known value.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<CoreError>>,
    /// When the current data settled. Cleared by invalidation.
    pub fetched_at: Option<Instant>,
    /// When the entry was last invalidated.
    pub invalidated_at: Option<Instant>,
    /// Wall-clock time of the last successful fetch, for display.
    pub updated_at: Option<DateTime<Utc>>,
    /// Whether the last read of this key was allowed to fetch.
    pub enabled: bool,
    /// Number of invalidations applied so far. A fetch issued before the
    /// latest invalidation settles as stale.
    pub(crate) invalidations: u64,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            invalidated_at: self.invalidated_at,
            updated_at: self.updated_at,
            enabled: self.enabled,
            invalidations: self.invalidations,
        }
    }
}

impl<T> CacheEntry<T> {
    pub(crate) fn idle(key: CacheKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            invalidated_at: None,
            updated_at: None,
            enabled: true,
            invalidations: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Marked stale by an invalidation and not refetched since.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some() && self.fetched_at.is_none()
    }

    /// Data can be served without refetching: successful, not invalidated
    /// since it settled, and younger than `stale_time`.
    pub fn is_fresh(&self, stale_time: Duration, now: Instant) -> bool {
        self.status == QueryStatus::Success
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }
}
