//! Query cache storage.
//!
//! Each key owns a slot holding a `watch` channel with the current
//! `CacheEntry` and at most one in-flight fetch. Fetches are spawned onto the
//! runtime and shared between callers, so a caller that stops awaiting never
//! strands the others.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info};

use super::config::CacheConfig;
use super::entry::{CacheEntry, QueryStatus};
use super::keys::QueryKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct InFlight<V, E> {
    seq: u64,
    fetch: SharedFetch<V, E>,
}

struct Slot<V, E> {
    state: watch::Sender<CacheEntry<V, E>>,
    in_flight: Option<InFlight<V, E>>,
    /// Sequence number of the last fetch written into `state`.
    settled_seq: u64,
    /// Fetches issued at or before this sequence number produce stale data.
    invalidated_seq: u64,
    fetched_at: Option<Instant>,
}

impl<V, E> Slot<V, E> {
    fn new() -> Self {
        let (state, _) = watch::channel(CacheEntry::idle());
        Self {
            state,
            in_flight: None,
            settled_seq: 0,
            invalidated_seq: 0,
            fetched_at: None,
        }
    }
}

struct Inner<V, E> {
    config: CacheConfig,
    slots: Mutex<LruCache<QueryKey, Slot<V, E>>>,
    next_seq: AtomicU64,
}

enum Plan<V, E> {
    Ready(CacheEntry<V, E>),
    Wait(SharedFetch<V, E>),
}

/// Key-based cache for remote reads with request de-duplication.
///
/// Cloning is cheap and every clone shares the same store; build one per
/// session and hand it to the consumers that need it.
pub struct QueryCache<V, E> {
    inner: Arc<Inner<V, E>>,
}

impl<V, E> Clone for QueryCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.max_entries_non_zero();
        Self {
            inner: Arc::new(Inner {
                config,
                slots: Mutex::new(LruCache::new(capacity)),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Read `key`, fetching through `fetcher` when there is no usable entry.
    ///
    /// A fresh success is returned as is. A success older than the stale time
    /// is returned as is and revalidated in the background. Anything else waits
    /// for a fetch, joining the one already in flight for `key` if there is one.
    pub async fn query<F, Fut>(&self, key: QueryKey, fetcher: F) -> CacheEntry<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        match self.plan(&key, fetcher) {
            Plan::Ready(entry) => entry,
            Plan::Wait(fetch) => {
                let result = fetch.await;
                self.snapshot(&key)
                    .unwrap_or_else(|| entry_from_result(result))
            }
        }
    }

    /// Mark `key` stale and query it again.
    pub async fn refetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> CacheEntry<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        {
            let mut slots = mutex_lock(&self.inner.slots, SOURCE, "refetch");
            if let Some(slot) = slots.peek_mut(&key) {
                self.inner.mark_stale(slot);
            }
        }
        self.query(key, fetcher).await
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    ///
    /// Returns the number of entries touched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut slots = mutex_lock(&self.inner.slots, SOURCE, "invalidate");
        let mut touched = 0;
        for (key, slot) in slots.iter_mut() {
            if key.starts_with(prefix) {
                self.inner.mark_stale(slot);
                touched += 1;
            }
        }
        info!(prefix = %prefix, invalidated = touched, "Query cache invalidated");
        touched
    }

    /// Store `value` for `key` as a fresh success without fetching.
    pub fn prime(&self, key: QueryKey, value: V) {
        let seq = self.inner.issue_seq();
        let mut slots = mutex_lock(&self.inner.slots, SOURCE, "prime");
        let slot = slot_mut(&mut slots, &key);
        slot.settled_seq = seq;
        slot.fetched_at = Some(Instant::now());
        slot.state.send_modify(|entry| {
            entry.status = QueryStatus::Success;
            entry.value = Some(value);
            entry.error = None;
            entry.is_stale = false;
            entry.updated_at = Some(OffsetDateTime::now_utc());
        });
    }

    /// Current entry for `key`; idle when nothing is cached.
    pub fn peek(&self, key: &QueryKey) -> CacheEntry<V, E> {
        self.snapshot(key).unwrap_or_default()
    }

    /// Register interest in `key`. The receiver sees every state transition.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<CacheEntry<V, E>> {
        let mut slots = mutex_lock(&self.inner.slots, SOURCE, "subscribe");
        slot_mut(&mut slots, key).state.subscribe()
    }

    /// Drop every entry. Open subscriptions observe their channel closing.
    pub fn clear(&self) {
        let mut slots = mutex_lock(&self.inner.slots, SOURCE, "clear");
        let dropped = slots.len();
        slots.clear();
        info!(dropped, "Query cache cleared");
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.slots, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self, key: &QueryKey) -> Option<CacheEntry<V, E>> {
        mutex_lock(&self.inner.slots, SOURCE, "snapshot")
            .peek(key)
            .map(|slot| slot.state.borrow().clone())
    }

    fn plan<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Plan<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let stale_time = self.inner.config.stale_time();
        let mut slots = mutex_lock(&self.inner.slots, SOURCE, "query");
        let slot = slot_mut(&mut slots, key);
        let entry = slot.state.borrow().clone();

        if entry.is_success() && !entry.is_stale {
            counter!("monk_query_cache_hit_total").increment(1);
            let aged = slot
                .fetched_at
                .is_some_and(|fetched| fetched.elapsed() >= stale_time);
            if aged && slot.in_flight.is_none() {
                debug!(key = %key, "Revalidating aged cache entry in background");
                self.start_fetch(key, slot, fetcher, false);
            }
            return Plan::Ready(entry);
        }

        if let Some(in_flight) = &slot.in_flight {
            counter!("monk_query_cache_dedup_total").increment(1);
            debug!(key = %key, seq = in_flight.seq, "Joining in-flight fetch");
            return Plan::Wait(in_flight.fetch.clone());
        }

        counter!("monk_query_cache_miss_total").increment(1);
        Plan::Wait(self.start_fetch(key, slot, fetcher, true))
    }

    fn start_fetch<F, Fut>(
        &self,
        key: &QueryKey,
        slot: &mut Slot<V, E>,
        fetcher: F,
        show_loading: bool,
    ) -> SharedFetch<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let seq = self.inner.issue_seq();
        if show_loading {
            slot.state.send_modify(|entry| entry.status = QueryStatus::Loading);
        }
        debug!(key = %key, seq, "Starting fetch");

        let inner = Arc::clone(&self.inner);
        let settle_key = key.clone();
        let request = fetcher();
        let fetch = async move {
            let result = request.await;
            inner.settle(&settle_key, seq, &result);
            result
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            seq,
            fetch: fetch.clone(),
        });
        tokio::spawn(fetch.clone());
        fetch
    }
}

impl<V, E> Inner<V, E>
where
    V: Clone,
    E: Clone,
{
    fn issue_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn mark_stale(&self, slot: &mut Slot<V, E>) {
        slot.in_flight = None;
        slot.invalidated_seq = self.next_seq.load(Ordering::SeqCst);
        slot.state.send_modify(|entry| entry.is_stale = true);
    }

    fn settle(&self, key: &QueryKey, seq: u64, result: &Result<V, E>) {
        let mut slots = mutex_lock(&self.slots, SOURCE, "settle");
        let Some(slot) = slots.peek_mut(key) else {
            debug!(key = %key, seq, "Dropping fetch result for evicted key");
            return;
        };

        if slot.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            slot.in_flight = None;
        }
        if seq < slot.settled_seq {
            counter!("monk_query_fetch_discarded_total").increment(1);
            debug!(
                key = %key,
                seq,
                settled_seq = slot.settled_seq,
                "Discarding superseded fetch result"
            );
            return;
        }

        let newer_pending = slot.in_flight.as_ref().is_some_and(|f| f.seq > seq);
        let stale = seq <= slot.invalidated_seq;
        match result {
            Ok(value) => {
                slot.settled_seq = seq;
                slot.fetched_at = Some(Instant::now());
                slot.state.send_modify(|entry| {
                    entry.value = Some(value.clone());
                    entry.updated_at = Some(OffsetDateTime::now_utc());
                    if !newer_pending {
                        entry.status = QueryStatus::Success;
                        entry.error = None;
                        entry.is_stale = stale;
                    }
                });
            }
            Err(_) if newer_pending => {
                debug!(key = %key, seq, "Ignoring failed fetch superseded by a pending one");
            }
            Err(err) => {
                slot.settled_seq = seq;
                slot.state.send_modify(|entry| {
                    entry.status = QueryStatus::Error;
                    entry.error = Some(err.clone());
                });
            }
        }
    }
}

fn slot_mut<'a, V, E>(
    slots: &'a mut LruCache<QueryKey, Slot<V, E>>,
    key: &QueryKey,
) -> &'a mut Slot<V, E> {
    if !slots.contains(key) {
        if let Some((evicted, _)) = slots.push(key.clone(), Slot::new()) {
            counter!("monk_query_cache_evict_total").increment(1);
            debug!(evicted = %evicted, "Evicted least recently used cache entry");
        }
    }
    slots.get_or_insert_mut(key.clone(), Slot::new)
}

fn entry_from_result<V, E>(result: Result<V, E>) -> CacheEntry<V, E> {
    let mut entry = CacheEntry::idle();
    entry.updated_at = Some(OffsetDateTime::now_utc());
    match result {
        Ok(value) => {
            entry.status = QueryStatus::Success;
            entry.value = Some(value);
        }
        Err(err) => {
            entry.status = QueryStatus::Error;
            entry.error = Some(err);
        }
    }
    entry
}
