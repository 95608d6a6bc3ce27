//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cache;
mod cache_key;
mod store;

#[cfg(test)]
pub use cache::MockCacheStore;
pub use cache::{CacheStore, CachedValue};
pub use cache_key::CacheKey;
#[cfg(test)]
pub use store::MockStore;
pub use store::{
    Change, ChangeSet, Snapshot, StagedChange, Store, StoreError, Table, map_store_error,
};
