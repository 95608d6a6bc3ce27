//! Persistence adapters implementing the store port.
//!
//! Only the in-process adapter ships today. Adapters translate change sets
//! into their backend's writes and must publish each change set atomically.

mod memory_store;

pub use memory_store::MemoryStore;
