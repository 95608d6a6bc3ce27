//! Typed result cache and the keys services cache under.
//!
//! Services read through [`ResultCache::try_get`] before computing a result
//! and write it back with the TTL for that result kind. Every mutation that
//! could stale a cached value removes its key after the mutation commits.
//! The cache never invalidates anything on its own; unremoved entries simply
//! expire.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::ports::{CacheKey, CacheStore};
use super::user::Program;

/// Deterministic cache keys.
pub mod keys {
    use super::{CacheKey, Program};

    const DOCTOR_STATS: &str = "doctor_stats";
    const DOCTOR_SUBJECTS: &str = "doctor_subjects";
    const DOCTOR_SUBJECTS_DETAIL: &str = "doctor_subjects_detail";
    const ALL_SUBJECTS: &str = "all_subjects";
    const ADMIN_ANALYTICS: &str = "admin_analytics";

    /// Ticket status counts of one doctor.
    pub fn doctor_stats(doctor_id: &str) -> CacheKey {
        CacheKey::scoped(DOCTOR_STATS, doctor_id)
    }

    /// Subjects assigned to one doctor, as listed to administrators.
    pub fn doctor_subjects(doctor_id: &str) -> CacheKey {
        CacheKey::scoped(DOCTOR_SUBJECTS, doctor_id)
    }

    /// Subjects of one doctor with per-subject ticket totals.
    pub fn doctor_subjects_detail(doctor_id: &str) -> CacheKey {
        CacheKey::scoped(DOCTOR_SUBJECTS_DETAIL, doctor_id)
    }

    /// Subject catalogue, optionally restricted to one program.
    pub fn all_subjects(program: Option<Program>) -> CacheKey {
        match program {
            Some(program) => CacheKey::scoped(ALL_SUBJECTS, program.as_str()),
            None => CacheKey::scoped(ALL_SUBJECTS, ""),
        }
    }

    /// Every variant of [`all_subjects`]: unscoped first, then per program.
    pub fn all_subjects_variants() -> Vec<CacheKey> {
        std::iter::once(None)
            .chain(Program::ALL.into_iter().map(Some))
            .map(all_subjects)
            .collect()
    }

    /// System-wide analytics dashboard.
    pub fn admin_analytics() -> CacheKey {
        CacheKey::scoped(ADMIN_ANALYTICS, "")
    }

    /// Keys derived from a doctor's tickets: status counts and subject
    /// detail.
    pub fn doctor_ticket_keys(doctor_id: &str) -> [CacheKey; 2] {
        [doctor_stats(doctor_id), doctor_subjects_detail(doctor_id)]
    }
}

/// Time-to-live per cached result kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Doctor ticket status counts.
    pub doctor_stats: Duration,
    /// Doctor subject list.
    pub doctor_subjects: Duration,
    /// Doctor subject detail with ticket totals.
    pub doctor_subjects_detail: Duration,
    /// Subject catalogue.
    pub all_subjects: Duration,
    /// Analytics dashboard.
    pub admin_analytics: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            doctor_stats: Duration::from_secs(5 * 60),
            doctor_subjects: Duration::from_secs(30 * 60),
            doctor_subjects_detail: Duration::from_secs(10 * 60),
            all_subjects: Duration::from_secs(60 * 60),
            admin_analytics: Duration::from_secs(10 * 60),
        }
    }
}

/// Typed facade over a [`CacheStore`], shared by every service.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttls: CacheTtls,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttls", &self.ttls)
            .finish_non_exhaustive()
    }
}

impl ResultCache {
    /// Wrap `store`, applying `ttls` to writes.
    pub fn new(store: Arc<dyn CacheStore>, ttls: CacheTtls) -> Self {
        Self { store, ttls }
    }

    /// Configured TTLs.
    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// Cached value under `key`, if present, unexpired and of type `T`.
    ///
    /// An entry of another type reads as a miss.
    pub fn try_get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        let Some(value) = self.store.get(key) else {
            debug!(key = %key, "cache miss");
            return None;
        };
        let typed = value.downcast_ref::<T>().cloned();
        if typed.is_none() {
            debug!(key = %key, "cache entry has unexpected type; treating as miss");
        } else {
            debug!(key = %key, "cache hit");
        }
        typed
    }

    /// Store `value` under `key` for `ttl`.
    pub fn set<T>(&self, key: CacheKey, value: T, ttl: Duration)
    where
        T: Any + Send + Sync,
    {
        self.store.set(key, Arc::new(value), ttl);
    }

    /// Invalidate one key.
    pub fn remove(&self, key: &CacheKey) {
        self.store.remove(key);
        debug!(key = %key, "cache key invalidated");
    }

    /// Invalidate every key in `keys`.
    pub fn remove_all<'k>(&self, keys: impl IntoIterator<Item = &'k CacheKey>) {
        for key in keys {
            self.remove(key);
        }
    }
}
