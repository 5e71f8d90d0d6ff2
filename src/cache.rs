/*!
The completion cache: per-argument-position, prefix-keyed, TTL-bounded, with
a debounce window that suppresses redundant asynchronous recomputation while
a prior request for the same key is still in flight.

The cache is an explicitly constructed, injectable service (create one,
share it, [`clear`][CompletionCache::clear] it), never module-level state, so
tests (and hosts with many isolated command sets) can hold independent
instances. All mutation is whole-entry insert/replace/evict under a single
lock; the lock is never held across an await.
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Tuning for [`CompletionCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// How long a computed suggestion list stays fresh.
    pub ttl: Duration,

    /// How long after dispatching an asynchronous computation the cache
    /// keeps answering "in flight" for the same position and prefix. While
    /// the window is open, duplicate requests get an empty list instead of
    /// a second computation; once it closes, a new request may redispatch
    /// even if the first never landed.
    pub debounce: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            debounce: Duration::from_millis(250),
        }
    }
}

#[derive(Debug)]
struct Entry {
    prefix: String,
    results: Option<Vec<String>>,
    stored_at: Instant,
    dispatched_at: Option<Instant>,
}

/// What [`CompletionCache::begin`] found for a position/prefix pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A fresh result list is available.
    Hit(Vec<String>),

    /// A computation for this exact key is in flight and inside the
    /// debounce window; the caller should answer with an empty list rather
    /// than computing again.
    Debounced,

    /// Nothing usable; the caller owns the (re)computation, and the cache
    /// has opened a new debounce window for it.
    Miss,
}

/// See the [module docs][self]. Clones share the same underlying map, so a
/// computation spawned off with a clone can back-fill the cache its caller
/// reads from.
#[derive(Debug, Clone, Default)]
pub struct CompletionCache {
    config: CacheConfig,
    entries: Arc<Mutex<HashMap<usize, Entry>>>,
}

impl CompletionCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /**
    Look up `prefix` at `position`, atomically claiming the computation on a
    miss.

    A [`Lookup::Miss`] is a claim: the cache records the dispatch time, and
    until the debounce window closes, other callers asking for the same key
    get [`Lookup::Debounced`]. The claimant reports back through
    [`fulfill`][Self::fulfill], possibly long after its own caller gave up
    waiting, which is fine; the late result serves the *next* lookup.
    */
    pub fn begin(&self, position: usize, prefix: &str) -> Lookup {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(&position) {
            if entry.prefix == prefix {
                if let Some(ref results) = entry.results {
                    if now.duration_since(entry.stored_at) < self.config.ttl {
                        trace!(position, prefix, "completion cache hit");
                        return Lookup::Hit(results.clone());
                    }
                }

                if let Some(dispatched_at) = entry.dispatched_at {
                    if now.duration_since(dispatched_at) < self.config.debounce {
                        trace!(position, prefix, "completion cache debounced");
                        return Lookup::Debounced;
                    }
                }
            }
        }

        entries.insert(
            position,
            Entry {
                prefix: prefix.to_owned(),
                results: None,
                stored_at: now,
                dispatched_at: Some(now),
            },
        );

        Lookup::Miss
    }

    /// Store a computed result list. Ignored if the entry has moved on to a
    /// different prefix since the computation was dispatched.
    pub fn fulfill(&self, position: usize, prefix: &str, results: Vec<String>) {
        let mut entries = self.entries.lock();

        match entries.get_mut(&position) {
            Some(entry) if entry.prefix == prefix => {
                debug!(position, prefix, count = results.len(), "completion cache filled");
                entry.results = Some(results);
                entry.stored_at = Instant::now();
                entry.dispatched_at = None;
            }
            _ => trace!(position, prefix, "stale completion result dropped"),
        }
    }

    /// Drop the entry for one argument position.
    pub fn invalidate(&self, position: usize) {
        self.entries.lock().remove(&position);
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CacheConfig, CompletionCache, Lookup};

    fn cache() -> CompletionCache {
        CompletionCache::new(CacheConfig {
            ttl: Duration::from_secs(60),
            debounce: Duration::from_secs(60),
        })
    }

    #[test]
    fn miss_claims_then_hit_after_fulfill() {
        let cache = cache();

        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);
        assert_eq!(cache.begin(0, "ap"), Lookup::Debounced);

        cache.fulfill(0, "ap", vec!["apple".to_owned()]);
        assert_eq!(cache.begin(0, "ap"), Lookup::Hit(vec!["apple".to_owned()]));
        // hits are idempotent
        assert_eq!(cache.begin(0, "ap"), Lookup::Hit(vec!["apple".to_owned()]));
    }

    #[test]
    fn a_changed_prefix_is_a_new_claim() {
        let cache = cache();

        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);
        assert_eq!(cache.begin(0, "app"), Lookup::Miss);

        // the original computation's result is now stale and dropped
        cache.fulfill(0, "ap", vec!["apple".to_owned()]);
        assert_eq!(cache.begin(0, "app"), Lookup::Debounced);
    }

    #[test]
    fn positions_are_independent() {
        let cache = cache();

        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);
        assert_eq!(cache.begin(1, "ap"), Lookup::Miss);
    }

    #[test]
    fn expired_results_are_recomputed() {
        let cache = CompletionCache::new(CacheConfig {
            ttl: Duration::ZERO,
            debounce: Duration::ZERO,
        });

        cache.begin(0, "ap");
        cache.fulfill(0, "ap", vec!["apple".to_owned()]);

        // with a zero TTL the stored result is already expired, and the
        // zero debounce window lets the recomputation through
        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);
    }

    #[test]
    fn clear_and_invalidate() {
        let cache = cache();

        cache.begin(0, "ap");
        cache.fulfill(0, "ap", vec!["apple".to_owned()]);
        cache.invalidate(0);
        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);

        cache.fulfill(0, "ap", vec!["apple".to_owned()]);
        cache.clear();
        assert_eq!(cache.begin(0, "ap"), Lookup::Miss);
    }
}
