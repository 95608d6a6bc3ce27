//! Port for the process-local result cache.
//!
//! Values are type-erased so one store can hold every cached DTO; the
//! [`crate::domain::ResultCache`] wrapper restores the concrete type on read.
//! Entries expire at an absolute deadline and are otherwise only removed by
//! explicit invalidation.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use super::CacheKey;

/// Shared, type-erased cached value.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Key/value store with per-entry absolute expiry.
#[cfg_attr(test, mockall::automock)]
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries read as absent.
    fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    /// Store `value`, replacing any previous entry, expiring after `ttl`.
    fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration);

    /// Drop an entry. Removing an absent key is a no-op.
    fn remove(&self, key: &CacheKey);
}
