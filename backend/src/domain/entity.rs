//! Persisted entity capability shared by repositories and the store port.
//!
//! An entity only has to name its table, expose a key, and say who assigns
//! that key. Relations are plain optional fields that eager-load hints fill
//! in after a query; they are never written back to the store.

use std::fmt::Debug;

/// Who chooses the key of a freshly inserted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The caller sets the key before staging the insert.
    Assigned,
    /// The store assigns a monotonically increasing sequence at commit time.
    Generated,
}

/// A record type owned by the persistence store.
///
/// `Key` must be totally ordered: the store keeps rows in key order, which is
/// the "store-defined" order a specification without a sort key observes.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Primary key type (string, integer, or a composite tuple).
    type Key: Clone + Ord + Debug + Send + Sync + 'static;

    /// Table name used in diagnostics.
    const KIND: &'static str;

    /// Key assignment strategy for inserts.
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::Assigned;

    /// Primary key of this row.
    fn key(&self) -> Self::Key;

    /// Receive a store-generated key. Only called for
    /// [`KeyStrategy::Generated`] entities.
    fn assign_generated_key(&mut self, _sequence: u64) {}

    /// Drop eagerly loaded relations before the row is staged for writing.
    fn detach(&mut self) {}
}
