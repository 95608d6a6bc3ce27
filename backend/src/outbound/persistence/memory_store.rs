//! In-process store holding every table in one copy-on-write snapshot.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::entity::Entity;
use crate::domain::ports::{Change, ChangeSet, Snapshot, Store, StoreError};

/// [`Store`] adapter keeping committed state in memory.
///
/// A commit applies the change set to a private copy of the current
/// snapshot and swaps it in only once every change succeeded. The swap runs
/// under the write lock with no suspension point between apply and publish,
/// so a dropped commit future leaves the previous state untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `rows` in one commit. Intended for start-up data and tests.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] when a key already exists; nothing is
    /// inserted in that case.
    pub async fn seed<E: Entity>(
        &self,
        rows: impl IntoIterator<Item = E>,
    ) -> Result<usize, StoreError> {
        let mut changes = ChangeSet::default();
        for mut row in rows {
            row.detach();
            changes.push(Change::Insert(row));
        }
        self.commit(&changes).await
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.state.read().await.clone())
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let affected = changes.apply_to(&mut next)?;
        *state = next;
        debug!(changes = changes.len(), affected, "memory store commit published");
        Ok(affected)
    }
}
