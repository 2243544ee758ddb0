//! Query cache configuration.
//!
//! The defaults here also back the `[cache]` settings table when it leaves a
//! key unset.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_STALE_TIME_MS: u64 = 30_000;
const DEFAULT_MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age (ms) after which a successful entry is revalidated in the background.
    pub stale_time_ms: u64,
    /// Maximum number of keys kept before least-recently-used eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: DEFAULT_STALE_TIME_MS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            stale_time_ms: settings.stale_time_ms,
            max_entries: settings.max_entries.get(),
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
