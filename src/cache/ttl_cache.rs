//! Time-bounded LRU cache with single-flight computation.
//!
//! Entries expire a fixed time after insertion. Expired entries are not
//! evicted proactively; the next access finds them stale, drops them and
//! recomputes.
//!
//! # Weight-Based Eviction
//!
//! Besides the entry-count bound of the LRU, every value has a weight
//! (bytes for thumbnails, 1 for booleans). When the total weight exceeds
//! the configured maximum, least-recently-used entries are evicted.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use tokio::sync::{Notify, RwLock};
use tokio::time::Instant;

/// Default validity window: 1 hour
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

struct Entries<K: Hash + Eq, V> {
    lru: LruCache<K, CacheEntry<V>>,
    weight: usize,
}

/// LRU cache whose entries expire after a fixed TTL.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
/// Writes follow "last write wins"; values are expected to be idempotent for
/// a given key within the TTL.
///
/// # Example
///
/// ```
/// use deck_streamer::cache::TtlCache;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let cache: TtlCache<String, bool> = TtlCache::new(Duration::from_secs(60));
///
///     let value = cache
///         .get_or_compute("https://example.com/001.png".to_string(), || async {
///             Ok::<_, std::convert::Infallible>(true)
///         })
///         .await;
///     assert_eq!(value, Ok(true));
///     assert_eq!(cache.get(&"https://example.com/001.png".to_string()).await, Some(true));
/// }
/// ```
pub struct TtlCache<K: Hash + Eq, V> {
    entries: RwLock<Entries<K, V>>,

    /// In-flight computations for the single-flight pattern.
    ///
    /// A std mutex so a dropped leader can deregister itself synchronously;
    /// it is never held across an await point.
    in_flight: Mutex<HashMap<K, Arc<Notify>>>,

    ttl: Duration,

    /// Maximum total weight
    max_weight: usize,

    weigher: fn(&V) -> usize,
}

fn unit_weight<V>(_: &V) -> usize {
    1
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache with the given TTL and default entry bound.
    ///
    /// Every entry weighs 1, so the weight bound equals the entry bound.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache holding at most `max_entries` entries.
    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self::with_weigher(ttl, max_entries, max_entries, unit_weight::<V>)
    }

    /// Create a cache bounded both by entry count and by total weight.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Validity window of each entry
    /// * `max_entries` - Maximum number of entries
    /// * `max_weight` - Maximum sum of `weigher(value)` over all entries
    /// * `weigher` - Weight of a single value
    pub fn with_weigher(
        ttl: Duration,
        max_entries: usize,
        max_weight: usize,
        weigher: fn(&V) -> usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(Entries {
                lru: LruCache::new(capacity),
                weight: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            max_weight,
            weigher,
        }
    }

    /// Get a fresh value from the cache.
    ///
    /// Marks the entry as recently used. A stale entry is dropped and
    /// reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().await;

        match entries.lru.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => return None,
        }

        if let Some(stale) = entries.lru.pop(key) {
            let weight = (self.weigher)(&stale.value);
            entries.weight = entries.weight.saturating_sub(weight);
        }
        None
    }

    /// Check for a fresh entry without updating LRU order.
    pub async fn contains(&self, key: &K) -> bool {
        let entries = self.entries.read().await;
        entries
            .lru
            .peek(key)
            .map(|entry| entry.inserted_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Store a value, restarting its TTL.
    ///
    /// Evicts least-recently-used entries until the cache is back within
    /// its weight bound.
    pub async fn insert(&self, key: K, value: V) {
        let weight = (self.weigher)(&value);
        let mut entries = self.entries.write().await;

        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };

        // push returns either the replaced value or the entry evicted for room
        if let Some((_, displaced)) = entries.lru.push(key, entry) {
            let displaced_weight = (self.weigher)(&displaced.value);
            entries.weight = entries.weight.saturating_sub(displaced_weight);
        }
        entries.weight += weight;

        while entries.weight > self.max_weight {
            match entries.lru.pop_lru() {
                Some((_, evicted)) => {
                    let evicted_weight = (self.weigher)(&evicted.value);
                    entries.weight = entries.weight.saturating_sub(evicted_weight);
                }
                None => break,
            }
        }
    }

    /// Remove an entry, returning its value if it was present.
    pub async fn invalidate(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().await;
        let removed = entries.lru.pop(key)?;
        let weight = (self.weigher)(&removed.value);
        entries.weight = entries.weight.saturating_sub(weight);
        Some(removed.value)
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Concurrent callers for the same key share a single run of the
    /// producer: one caller becomes the leader, the others wait for it and
    /// then read the cache. Errors are returned to the leader and not
    /// cached; a waiter that finds no value after the leader finishes, fails
    /// or is dropped takes over as the next leader.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        loop {
            // Fast path: check cache
            if let Some(value) = self.get(&key).await {
                return Ok(value);
            }

            // Slow path: wait for a leader or become one
            let existing = {
                let mut in_flight = lock_in_flight(&self.in_flight);
                match in_flight.get(&key) {
                    Some(existing) => Some(Arc::clone(existing)),
                    None => {
                        in_flight.insert(key.clone(), Arc::new(Notify::new()));
                        None
                    }
                }
            };

            if let Some(existing) = existing {
                let mut notified = pin!(existing.notified());
                notified.as_mut().enable();

                // The leader deregisters before notifying, so if it is still
                // registered here the wakeup cannot be missed
                let still_running = lock_in_flight(&self.in_flight)
                    .get(&key)
                    .is_some_and(|current| Arc::ptr_eq(current, &existing));
                if still_running {
                    notified.await;
                }
                continue;
            }

            // Deregisters and wakes waiters on every exit, cancellation included
            let _leader = LeaderGuard {
                in_flight: &self.in_flight,
                key: key.clone(),
            };

            // The previous leader may have finished between the fast path
            // and registration
            if let Some(value) = self.peek_fresh(&key).await {
                return Ok(value);
            }

            let result = producer().await;

            if let Ok(ref value) = result {
                self.insert(key.clone(), value.clone()).await;
            }

            return result;
        }
    }

    async fn peek_fresh(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .lru
            .peek(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Clear all entries.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.lru.clear();
        entries.weight = 0;
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.lru.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.lru.is_empty()
    }

    /// Current total weight.
    pub async fn weight(&self) -> usize {
        self.entries.read().await.weight
    }

    /// Maximum total weight.
    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    /// Validity window of each entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Registration of the task computing a key.
///
/// Dropping it removes the key from the in-flight map and wakes every
/// waiter, which then retries and may become the next leader.
struct LeaderGuard<'a, K: Hash + Eq> {
    in_flight: &'a Mutex<HashMap<K, Arc<Notify>>>,
    key: K,
}

impl<K: Hash + Eq> Drop for LeaderGuard<'_, K> {
    fn drop(&mut self) {
        let notify = lock_in_flight(self.in_flight).remove(&self.key);
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }
}

/// The map stays consistent even if a holder panicked, so poisoning is ignored.
fn lock_in_flight<K>(
    in_flight: &Mutex<HashMap<K, Arc<Notify>>>,
) -> MutexGuard<'_, HashMap<K, Arc<Notify>>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Tests
// =============================================================================
