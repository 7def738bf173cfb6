// ── Query cache ──
//
// Keyed, deduplicated storage for fetched resources with staleness
// tracking and push-based change notification.

mod entry;
mod key;
mod query_cache;
mod stream;

pub use entry::{CacheEntry, QueryStatus};
pub use key::{CacheKey, KeyPart};
pub use query_cache::{QueryCache, ReadOptions};
pub use stream::{QueryStream, QueryWatchStream};
