//! Generic repository over one entity type.
//!
//! Writes are staged into the owning unit of work and only reach the store
//! on [`crate::domain::UnitOfWork::save_changes`]. Reads always go to the
//! committed state, so a row added in this unit of work is invisible to
//! queries until it has been saved.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::entity::Entity;
use crate::domain::ports::{Change, ChangeSet, Store, StoreError};
use crate::domain::specification::{QuerySet, Specification, evaluate};

/// CRUD access to the rows of `E`.
///
/// Obtained from [`crate::domain::UnitOfWork::repository`]; every
/// repository of one unit of work shares its staged change set.
pub struct Repository<E: Entity> {
    store: Arc<dyn Store>,
    staged: Arc<Mutex<ChangeSet>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub(crate) fn new(store: Arc<dyn Store>, staged: Arc<Mutex<ChangeSet>>) -> Self {
        Self {
            store,
            staged,
            _entity: PhantomData,
        }
    }

    fn lock_staged(&self) -> MutexGuard<'_, ChangeSet> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage(&self, change: Change<E>) {
        let mut staged = self.lock_staged();
        staged.push(change);
        debug!(entity = E::KIND, staged = staged.len(), "change staged");
    }

    /// Stage an insert. A duplicate key fails the commit with
    /// [`StoreError::Conflict`].
    pub fn add(&self, mut entity: E) {
        entity.detach();
        self.stage(Change::Insert(entity));
    }

    /// Stage a modification of an existing row. The commit fails with
    /// [`StoreError::Conflict`] if the row is gone by then.
    pub fn update(&self, mut entity: E) {
        entity.detach();
        self.stage(Change::Update(entity));
    }

    /// Every committed row in key order.
    ///
    /// Unbounded: prefer a paged [`Specification`] for large tables.
    pub async fn get_all(&self) -> Result<Vec<E>, StoreError> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.rows::<E>().cloned().collect())
    }

    /// Rows selected by `spec`; `None` behaves like [`Self::get_all`].
    pub async fn get_all_matching(
        &self,
        spec: Option<&Specification<E>>,
    ) -> Result<Vec<E>, StoreError> {
        let Some(spec) = spec else {
            return self.get_all().await;
        };
        let snapshot = self.store.snapshot().await?;
        Ok(evaluate(QuerySet::from_snapshot(&snapshot), spec).into_vec())
    }

    /// Look up one committed row.
    pub async fn get_by_id(&self, key: &E::Key) -> Result<Option<E>, StoreError> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.find::<E>(key).cloned())
    }

    /// Stage removal of the row with `key` if it exists.
    ///
    /// Returns whether a removal was staged; deleting an absent row stages
    /// nothing.
    pub async fn delete(&self, key: &E::Key) -> Result<bool, StoreError> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.find::<E>(key).is_none() {
            debug!(entity = E::KIND, ?key, "delete skipped: row absent");
            return Ok(false);
        }
        self.stage(Change::Delete(key.clone()));
        Ok(true)
    }

    /// Number of rows satisfying the criteria of `spec`.
    ///
    /// Paging, eager loads and ordering are ignored, so this is the total a
    /// paged query over the same specification draws from.
    pub async fn count(&self, spec: &Specification<E>) -> Result<usize, StoreError> {
        let snapshot = self.store.snapshot().await?;
        Ok(QuerySet::matching(&snapshot, spec.criteria()).len())
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
