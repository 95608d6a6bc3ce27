//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: [`persistence::MemoryStore`], an in-process
//!   transactional store behind the `Store` port.
//! - **cache**: [`cache::InMemoryCacheStore`], a concurrent TTL cache behind
//!   the `CacheStore` port.
//!
//! Adapters are thin translators with no business logic.

pub mod cache;
pub mod persistence;
