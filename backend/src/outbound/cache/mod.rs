//! In-process result cache adapter.
//!
//! Entries live in a concurrent map keyed by [`CacheKey`] and carry an
//! absolute expiry instant computed from the injected clock at write time.
//! Expired entries are dropped lazily when read.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{CacheKey, CacheStore, CachedValue};

#[derive(Clone)]
struct Entry {
    value: CachedValue,
    expires_at: DateTime<Utc>,
}

/// [`CacheStore`] backed by a `DashMap`.
pub struct InMemoryCacheStore {
    entries: DashMap<CacheKey, Entry>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheStore")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl InMemoryCacheStore {
    /// Empty cache reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until next read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expiry_after(&self, ttl: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| self.clock.utc().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = self.clock.utc();
        let entry = self.entries.get(key).map(|entry| entry.value().clone())?;
        if entry.expires_at <= now {
            self.entries
                .remove_if(key, |_, stored| stored.expires_at <= now);
            debug!(key = %key, "cache entry expired");
            return None;
        }
        Some(entry.value)
    }

    fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        let expires_at = self.expiry_after(ttl);
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    //! Expiry and replacement behaviour of the in-memory cache.
    use super::*;
    use crate::test_support::MutableClock;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        let now = Utc
            .with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
            .single()
            .expect("valid instant");
        Arc::new(MutableClock::new(now))
    }

    fn key(raw: &str) -> CacheKey {
        CacheKey::scoped(raw, "")
    }

    fn read_u32(cache: &InMemoryCacheStore, raw: &str) -> Option<u32> {
        cache
            .get(&key(raw))
            .and_then(|value| value.downcast_ref::<u32>().copied())
    }

    #[rstest]
    fn entries_live_until_their_deadline(clock: Arc<MutableClock>) {
        let cache = InMemoryCacheStore::new(clock.clone());
        cache.set(key("doctor_stats_D01"), Arc::new(7_u32), Duration::from_secs(300));

        clock.advance(Duration::from_secs(299));
        assert_eq!(read_u32(&cache, "doctor_stats_D01"), Some(7));

        clock.advance(Duration::from_secs(1));
        assert_eq!(read_u32(&cache, "doctor_stats_D01"), None);
        assert!(cache.is_empty());
    }

    #[rstest]
    fn set_replaces_value_and_deadline(clock: Arc<MutableClock>) {
        let cache = InMemoryCacheStore::new(clock.clone());
        cache.set(key("all_subjects"), Arc::new(1_u32), Duration::from_secs(10));
        clock.advance(Duration::from_secs(5));
        cache.set(key("all_subjects"), Arc::new(2_u32), Duration::from_secs(10));
        clock.advance(Duration::from_secs(9));

        assert_eq!(read_u32(&cache, "all_subjects"), Some(2));
    }

    #[rstest]
    fn remove_is_idempotent(clock: Arc<MutableClock>) {
        let cache = InMemoryCacheStore::new(clock);
        cache.set(key("admin_analytics"), Arc::new(1_u32), Duration::from_secs(10));
        cache.remove(&key("admin_analytics"));
        cache.remove(&key("admin_analytics"));
        assert_eq!(read_u32(&cache, "admin_analytics"), None);
    }

    #[rstest]
    fn oversized_ttl_never_expires(clock: Arc<MutableClock>) {
        let cache = InMemoryCacheStore::new(clock.clone());
        cache.set(key("all_subjects"), Arc::new(3_u32), Duration::MAX);
        clock.advance(Duration::from_secs(86_400 * 365));
        assert_eq!(read_u32(&cache, "all_subjects"), Some(3));
    }
}
