//! Monk query cache
//!
//! Memoizes remote reads by composite key:
//!
//! - **Entries**: idle/loading/success/error with the last good value kept
//!   across refetches
//! - **De-duplication**: at most one fetch in flight per key
//! - **Invalidation**: by key prefix, forcing the next read to refetch
//! - **Subscriptions**: per-key `watch` receivers notified on every transition
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! stale_time_ms = 30000
//! max_entries = 256
//! ```

mod config;
mod entry;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use entry::{CacheEntry, QueryStatus};
pub use keys::QueryKey;
pub use store::QueryCache;

pub(crate) use lock::mutex_lock;

/// Something that can mark cached reads stale.
pub trait Invalidate: Send + Sync {
    fn invalidate(&self, prefix: &QueryKey) -> usize;
}

impl<V, E> Invalidate for QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn invalidate(&self, prefix: &QueryKey) -> usize {
        QueryCache::invalidate(self, prefix)
    }
}
