//! Resource synchronization layer between `classdesk-api` and dashboard
//! views (CLI or UI).
//!
//! - **[`Dashboard`]**: facade owning one session store, API client, query
//!   cache and mutation runner, built explicitly from a
//!   [`DashboardConfig`]. Views read and write only through it.
//!
//! - **[`QueryCache<T>`]**: keyed store of fetched results built on `DashMap`
//!   + `tokio::sync::watch`. Deduplicates in-flight fetches per key, serves
//!   fresh data without refetching, and keeps last-known data across errors
//!   and invalidations.
//!
//! - **[`QueryStream<T>`]**: subscription handle vended by the cache.
//!   Exposes `current()` / `latest()` / `changed()` / `settled()`. Dropping
//!   every handle for a key discards its in-flight result.
//!
//! - **[`MutationRunner`]** + **[`InvalidationRouter`]**: writes go through
//!   the runner; once the server confirms one, the router's prefixes for
//!   that [`OperationKind`] are marked stale and refetched on next read.
//!
//! - **Catalogue** ([`ResourceKind`], [`OperationKind`]): every readable
//!   resource and write operation, with its endpoint and id field.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod invalidation;
pub mod mutation;
pub mod operation;
pub mod resource;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{
    CacheEntry, CacheKey, KeyPart, QueryCache, QueryStatus, QueryStream, QueryWatchStream,
    ReadOptions,
};
pub use config::{DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use invalidation::InvalidationRouter;
pub use mutation::MutationRunner;
pub use operation::{MutationRequest, OperationKind};
pub use resource::{Endpoint, ResourceKind, ResourceQuery};

// Session types consumers need without depending on the API crate.
pub use classdesk_api::{AuthError, Session, SessionStore};
