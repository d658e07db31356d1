//! Keyed get-or-fetch cache with stale-while-revalidate.
//!
//! Entries are never evicted. Each key owns a slot holding the current entry
//! and a flight lock; a refresh holds the flight lock for the duration of the
//! upstream call so concurrent misses on the same key share one fetch, while
//! other keys proceed untouched. Callers queued behind a failed refresh reuse
//! its error instead of going upstream again.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::FetchResult;

pub const DEFAULT_FRESH_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(300);

/// Values the cache can hand out as a stale copy.
pub trait MarkStale {
    fn mark_stale(&self) -> Self;
}

impl MarkStale for FetchResult {
    fn mark_stale(&self) -> Self {
        Self {
            stale: true,
            ..self.clone()
        }
    }
}

/// Failures surfaced to cache callers.
#[derive(Debug, Error)]
pub enum CacheError<E> {
    #[error("fetch failed with nothing cached: {source}")]
    Fetch { source: E },
    #[error("fetch failed and cached value is {}s old, past the stale grace: {source}", .age.as_secs())]
    StaleGraceExpired { age: Duration, source: E },
}

impl<E> CacheError<E> {
    /// The upstream error that triggered this failure.
    pub fn fetch_error(&self) -> &E {
        match self {
            Self::Fetch { source } | Self::StaleGraceExpired { source, .. } => source,
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    fetched_at: i64,
}

#[derive(Debug)]
struct Slot<V, E> {
    entry: RwLock<Option<Arc<CacheEntry<V>>>>,
    /// Error of the last finished refresh, `None` when it succeeded.
    flight: tokio::sync::Mutex<Option<E>>,
    /// Bumped under the flight lock each time a refresh finishes.
    finished: AtomicU64,
}

impl<V, E> Slot<V, E> {
    fn new() -> Self {
        Self {
            entry: RwLock::new(None),
            flight: tokio::sync::Mutex::new(None),
            finished: AtomicU64::new(0),
        }
    }

    fn current(&self) -> Option<Arc<CacheEntry<V>>> {
        self.entry
            .read()
            .expect("cache slot lock should not be poisoned")
            .clone()
    }

    fn replace(&self, entry: CacheEntry<V>) {
        *self
            .entry
            .write()
            .expect("cache slot lock should not be poisoned") = Some(Arc::new(entry));
    }
}

/// Process-wide cache fronting an expensive fetch.
pub struct StaleCache<K, V, E> {
    slots: RwLock<HashMap<K, Arc<Slot<V, E>>>>,
    clock: Arc<dyn Clock>,
    fresh_ttl: Duration,
    stale_ttl: Duration,
}

impl<K, V, E> StaleCache<K, V, E>
where
    K: Eq + Hash + Clone + Display,
    V: MarkStale,
    E: Clone + Display,
{
    pub fn new(
        clock: Arc<dyn Clock>,
        fresh_ttl: Duration,
        stale_ttl: Duration,
    ) -> Result<Self, ValidationError> {
        if fresh_ttl.is_zero() {
            return Err(ValidationError::ZeroFreshTtl);
        }
        if stale_ttl <= fresh_ttl {
            return Err(ValidationError::StaleTtlNotAfterFresh {
                fresh_secs: fresh_ttl.as_secs(),
                stale_secs: stale_ttl.as_secs(),
            });
        }

        Ok(Self {
            slots: RwLock::new(HashMap::new()),
            clock,
            fresh_ttl,
            stale_ttl,
        })
    }

    /// 60 s fresh, 300 s stale grace.
    pub fn with_default_ttls(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            clock,
            fresh_ttl: DEFAULT_FRESH_TTL,
            stale_ttl: DEFAULT_STALE_TTL,
        }
    }

    pub fn fresh_ttl(&self) -> Duration {
        self.fresh_ttl
    }

    pub fn stale_ttl(&self) -> Duration {
        self.stale_ttl
    }

    /// Returns the cached value for `key`, refreshing it through `fetch` once
    /// it is older than the fresh ttl.
    ///
    /// A failed refresh falls back to a stale-marked copy of the previous value
    /// while that value is younger than the stale ttl. The stored entry and its
    /// timestamp are left untouched in that case.
    ///
    /// Callers that queued on the key while a refresh was in flight share its
    /// outcome: a success is served from the new entry, a failure is resolved
    /// against the stale grace without another call to `fetch`.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<Arc<V>, CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key);
        if let Some(value) = self.fresh_value(&slot) {
            debug!(%key, "cache hit");
            return Ok(value);
        }

        let seen = slot.finished.load(Ordering::Acquire);
        let mut flight = slot.flight.lock().await;
        if let Some(value) = self.fresh_value(&slot) {
            debug!(%key, "cache refreshed by concurrent caller");
            return Ok(value);
        }
        if slot.finished.load(Ordering::Acquire) != seen {
            if let Some(error) = flight.as_ref() {
                debug!(%key, "reusing failure of concurrent refresh");
                return self.fall_back(&key, slot.current(), error.clone());
            }
        }

        let previous = slot.current();
        debug!(%key, cached = previous.is_some(), "cache miss, fetching");

        let outcome = fetch().await;
        *flight = outcome.as_ref().err().cloned();
        slot.finished.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                slot.replace(CacheEntry {
                    value: Arc::clone(&value),
                    fetched_at: self.clock.now_millis(),
                });
                Ok(value)
            }
            Err(error) => self.fall_back(&key, previous, error),
        }
    }

    fn fall_back(
        &self,
        key: &K,
        previous: Option<Arc<CacheEntry<V>>>,
        error: E,
    ) -> Result<Arc<V>, CacheError<E>> {
        let Some(entry) = previous else {
            warn!(%key, %error, "fetch failed with nothing cached");
            return Err(CacheError::Fetch { source: error });
        };

        let age = self.age(&entry);
        if age < self.stale_ttl {
            warn!(%key, %error, age_secs = age.as_secs(), "serving stale value");
            Ok(Arc::new(entry.value.mark_stale()))
        } else {
            warn!(%key, %error, age_secs = age.as_secs(), "stale grace expired");
            Err(CacheError::StaleGraceExpired {
                age,
                source: error,
            })
        }
    }

    /// Epoch millis of the last successful fetch for `key`.
    pub fn fetched_at(&self, key: &K) -> Option<i64> {
        let slots = self
            .slots
            .read()
            .expect("cache slot map lock should not be poisoned");
        slots
            .get(key)
            .and_then(|slot| slot.current())
            .map(|entry| entry.fetched_at)
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        let slots = self
            .slots
            .read()
            .expect("cache slot map lock should not be poisoned");
        slots
            .values()
            .filter(|slot| slot.current().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &K) -> Arc<Slot<V, E>> {
        if let Some(slot) = self
            .slots
            .read()
            .expect("cache slot map lock should not be poisoned")
            .get(key)
        {
            return Arc::clone(slot);
        }

        let mut slots = self
            .slots
            .write()
            .expect("cache slot map lock should not be poisoned");
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    fn fresh_value(&self, slot: &Slot<V, E>) -> Option<Arc<V>> {
        slot.current()
            .filter(|entry| self.age(entry) < self.fresh_ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    fn age(&self, entry: &CacheEntry<V>) -> Duration {
        let elapsed = self.clock.now_millis().saturating_sub(entry.fetched_at);
        Duration::from_millis(elapsed.max(0) as u64)
    }
}
