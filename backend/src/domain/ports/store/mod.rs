//! Port for the transactional entity store.
//!
//! Reads work against a [`Snapshot`] of committed state; writes are collected
//! in a [`ChangeSet`] and published by [`Store::commit`] as a single atomic
//! step. Adapters must never expose a partially applied change set, including
//! when the commit future is dropped mid-flight.

mod change_set;
mod snapshot;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Error;

pub use change_set::{Change, ChangeSet, StagedChange};
pub use snapshot::{Snapshot, Table};

define_port_error! {
    /// Errors raised by store adapters.
    pub enum StoreError {
        /// Primary-key collision on insert, or update of a vanished row.
        Conflict { message: String } => "store conflict: {message}",
        /// Temporary failure; the same commit may succeed on retry.
        Transient { message: String } => "store temporarily unavailable: {message}",
        /// The commit did not finish within its deadline.
        Timeout => "store commit timed out",
        /// Any other adapter failure.
        Query { message: String } => "store query failed: {message}",
    }
}

impl StoreError {
    /// Whether a unit of work may retry the failed commit.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout)
    }
}

/// Map a store failure to the domain error surfaced by services.
///
/// Conflicts are user-visible validation failures; exhausted retries mean the
/// store is unavailable.
pub fn map_store_error(error: StoreError) -> Error {
    match error {
        StoreError::Conflict { message } => Error::invalid_request(message),
        StoreError::Transient { message } => {
            Error::service_unavailable(format!("store unavailable: {message}"))
        }
        StoreError::Timeout => Error::service_unavailable("store commit timed out"),
        StoreError::Query { message } => Error::internal(format!("store error: {message}")),
    }
}

/// Durable home of every entity table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Current committed state.
    async fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Apply every change in order, all or nothing, returning the number of
    /// affected rows.
    async fn commit(&self, changes: &ChangeSet) -> Result<usize, StoreError>;
}
