//! Snapshot of one cached query.

use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// What subscribers and `query` callers observe for a key.
///
/// `value` survives refetches and failures so a view can keep showing the
/// last good data while a new request is running.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V, E> {
    pub status: QueryStatus,
    pub value: Option<V>,
    pub error: Option<E>,
    pub is_stale: bool,
    pub updated_at: Option<OffsetDateTime>,
}

impl<V, E> CacheEntry<V, E> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            value: None,
            error: None,
            is_stale: false,
            updated_at: None,
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

    /// Convert the cached value, keeping status and metadata.
    pub fn map<U>(self, f: impl FnOnce(V) -> Option<U>) -> CacheEntry<U, E> {
        CacheEntry {
            status: self.status,
            value: self.value.and_then(f),
            error: self.error,
            is_stale: self.is_stale,
            updated_at: self.updated_at,
        }
    }
}

impl<V, E> Default for CacheEntry<V, E> {
    fn default() -> Self {
        Self::idle()
    }
}
