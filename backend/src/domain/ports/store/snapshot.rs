//! Immutable, type-indexed view of every table in the store.
//!
//! Tables are held behind `Arc`s so cloning a snapshot is cheap. Writers
//! obtain a private copy of a table on first mutation (copy-on-write), which
//! lets a commit build the next state off to the side and publish it in one
//! swap.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::entity::{Entity, KeyStrategy};

use super::StoreError;

/// Rows of one entity type, ordered by key.
#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    rows: BTreeMap<E::Key, E>,
    last_sequence: u64,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_sequence: 0,
        }
    }
}

impl<E: Entity> Table<E> {
    /// Look a row up by key.
    pub fn get(&self, key: &E::Key) -> Option<&E> {
        self.rows.get(key)
    }

    /// Iterate rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert a new row, assigning a sequence key when the entity asks for
    /// one. Fails with a conflict when the key is already taken.
    pub fn insert(&mut self, mut entity: E) -> Result<E::Key, StoreError> {
        if E::KEY_STRATEGY == KeyStrategy::Generated {
            self.last_sequence += 1;
            entity.assign_generated_key(self.last_sequence);
        }
        let key = entity.key();
        if self.rows.contains_key(&key) {
            return Err(StoreError::conflict(format!(
                "{} with key {key:?} already exists",
                E::KIND
            )));
        }
        self.rows.insert(key.clone(), entity);
        Ok(key)
    }

    /// Replace an existing row. Fails with a conflict when the row is gone.
    pub fn replace(&mut self, entity: E) -> Result<(), StoreError> {
        let key = entity.key();
        match self.rows.get_mut(&key) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(StoreError::conflict(format!(
                "{} with key {key:?} no longer exists",
                E::KIND
            ))),
        }
    }

    /// Remove a row, returning how many rows were affected (0 or 1).
    pub fn remove(&mut self, key: &E::Key) -> usize {
        usize::from(self.rows.remove(key).is_some())
    }
}

trait AnyTable: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_table(&self) -> Arc<dyn AnyTable>;
    fn row_count(&self) -> usize;
}

impl<E: Entity> AnyTable for Table<E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_table(&self) -> Arc<dyn AnyTable> {
        Arc::new(self.clone())
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

/// Point-in-time state of the store.
#[derive(Clone, Default)]
pub struct Snapshot {
    tables: HashMap<TypeId, Arc<dyn AnyTable>>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows: usize = self.tables.values().map(|table| table.row_count()).sum();
        f.debug_struct("Snapshot")
            .field("tables", &self.tables.len())
            .field("rows", &rows)
            .finish()
    }
}

impl Snapshot {
    /// Borrow the table for `E`, if any row of that type was ever stored.
    pub fn table<E: Entity>(&self) -> Option<&Table<E>> {
        self.tables
            .get(&TypeId::of::<E>())
            .and_then(|table| table.as_any().downcast_ref::<Table<E>>())
    }

    /// Iterate every row of `E` in key order.
    pub fn rows<E: Entity>(&self) -> impl Iterator<Item = &E> {
        self.table::<E>().into_iter().flat_map(Table::iter)
    }

    /// Find one row of `E` by key.
    pub fn find<E: Entity>(&self, key: &E::Key) -> Option<&E> {
        self.table::<E>().and_then(|table| table.get(key))
    }

    /// Number of rows of `E`.
    pub fn count<E: Entity>(&self) -> usize {
        self.table::<E>().map_or(0, Table::len)
    }

    /// Mutable access to the table for `E`, copying it first if another
    /// snapshot still shares it. Intended for store adapters building the
    /// next committed state.
    pub fn table_mut<E: Entity>(&mut self) -> Result<&mut Table<E>, StoreError> {
        let slot = self
            .tables
            .entry(TypeId::of::<E>())
            .or_insert_with(|| -> Arc<dyn AnyTable> { Arc::new(Table::<E>::default()) });
        if Arc::get_mut(slot).is_none() {
            *slot = slot.clone_table();
        }
        Arc::get_mut(slot)
            .and_then(|table| table.as_any_mut().downcast_mut::<Table<E>>())
            .ok_or_else(|| StoreError::query(format!("{} table is shared or mistyped", E::KIND)))
    }
}
