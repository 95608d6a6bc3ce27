//! Staged writes collected by a unit of work and committed as one batch.

use std::fmt;

use crate::domain::entity::Entity;

use super::{Snapshot, StoreError};

/// One staged write against a single entity type.
#[derive(Debug, Clone)]
pub enum Change<E: Entity> {
    /// Insert a new row.
    Insert(E),
    /// Overwrite an existing row.
    Update(E),
    /// Remove a row by key.
    Delete(E::Key),
}

impl<E: Entity> Change<E> {
    fn verb(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// Type-erased staged change, applied by store adapters in program order.
pub trait StagedChange: Send + Sync {
    /// Apply the change to the next state, returning the affected row count.
    ///
    /// Takes `&self` so a failed commit can be retried with the same batch.
    fn apply(&self, next: &mut Snapshot) -> Result<usize, StoreError>;

    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;
}

impl<E: Entity> StagedChange for Change<E> {
    fn apply(&self, next: &mut Snapshot) -> Result<usize, StoreError> {
        let table = next.table_mut::<E>()?;
        match self {
            Self::Insert(entity) => table.insert(entity.clone()).map(|_| 1),
            Self::Update(entity) => table.replace(entity.clone()).map(|()| 1),
            Self::Delete(key) => Ok(table.remove(key)),
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", self.verb(), E::KIND)
    }
}

/// Ordered batch of staged changes.
#[derive(Default)]
pub struct ChangeSet {
    changes: Vec<Box<dyn StagedChange>>,
}

impl fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.changes.iter().map(|change| change.describe()))
            .finish()
    }
}

impl ChangeSet {
    /// Append a change after every change already staged.
    pub fn push<E: Entity>(&mut self, change: Change<E>) {
        self.changes.push(Box::new(change));
    }

    /// Append every change of `other`, keeping its order.
    pub fn extend(&mut self, other: Self) {
        self.changes.extend(other.changes);
    }

    /// Number of staged changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply every change to `next` in staging order.
    ///
    /// Stops at the first failure; callers discard `next` in that case so
    /// none of the batch becomes visible.
    pub fn apply_to(&self, next: &mut Snapshot) -> Result<usize, StoreError> {
        self.changes
            .iter()
            .try_fold(0, |affected, change| Ok(affected + change.apply(next)?))
    }
}

#[cfg(test)]
mod tests {
    //! Ordering and atomicity of batch application.
    use super::*;
    use crate::domain::Subject;
    use crate::domain::test_fixtures::subject;
    use rstest::rstest;

    #[rstest]
    fn changes_apply_in_staging_order() {
        let mut changes = ChangeSet::default();
        changes.push(Change::Insert(subject("BIS101", 1)));
        changes.push(Change::<Subject>::Delete("BIS101".to_owned()));
        changes.push(Change::Insert(subject("BIS101", 2)));

        let mut next = Snapshot::default();
        let affected = changes.apply_to(&mut next).expect("batch applies");

        assert_eq!(affected, 3);
        let stored = next.find::<Subject>(&"BIS101".to_owned()).expect("row present");
        assert_eq!(stored.level, 2);
    }

    #[rstest]
    fn deleting_an_absent_row_affects_nothing() {
        let mut changes = ChangeSet::default();
        changes.push(Change::<Subject>::Delete("NOPE".to_owned()));
        let affected = changes
            .apply_to(&mut Snapshot::default())
            .expect("delete applies");
        assert_eq!(affected, 0);
    }

    #[rstest]
    fn debug_lists_each_change() {
        let mut changes = ChangeSet::default();
        changes.push(Change::Insert(subject("BIS101", 1)));
        changes.push(Change::Update(subject("BIS101", 1)));
        assert_eq!(
            format!("{changes:?}"),
            r#"["insert subjects", "update subjects"]"#
        );
    }
}
