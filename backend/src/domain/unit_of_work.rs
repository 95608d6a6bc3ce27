//! Unit of work: one persistence session per logical operation.
//!
//! A unit of work owns the staged change set, hands out exactly one
//! [`Repository`] per entity type, and commits everything staged through any
//! of them in a single atomic store operation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::entity::Entity;
use crate::domain::ports::{ChangeSet, Store, StoreError};
use crate::domain::repository::Repository;

/// Retry and timeout settings applied to every commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPolicy {
    /// Total attempts for a transient failure, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
    /// Deadline for one commit attempt.
    pub commit_timeout: Duration,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            commit_timeout: Duration::from_secs(5),
        }
    }
}

type ErasedRepository = Arc<dyn Any + Send + Sync>;

/// Request-scoped persistence session.
pub struct UnitOfWork {
    store: Arc<dyn Store>,
    policy: CommitPolicy,
    staged: Arc<Mutex<ChangeSet>>,
    repositories: HashMap<TypeId, ErasedRepository>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("policy", &self.policy)
            .field("staged", &self.staged_len())
            .field("repositories", &self.repositories.len())
            .finish_non_exhaustive()
    }
}

impl UnitOfWork {
    /// Open a session against `store`.
    pub fn new(store: Arc<dyn Store>, policy: CommitPolicy) -> Self {
        Self {
            store,
            policy,
            staged: Arc::new(Mutex::new(ChangeSet::default())),
            repositories: HashMap::new(),
        }
    }

    fn lock_staged(&self) -> MutexGuard<'_, ChangeSet> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Repository for `E`, created on first request.
    ///
    /// Later calls for the same `E` return the same instance.
    pub fn repository<E: Entity>(&mut self) -> Arc<Repository<E>> {
        let type_id = TypeId::of::<E>();
        if let Some(repository) = self
            .repositories
            .get(&type_id)
            .and_then(|erased| Arc::clone(erased).downcast::<Repository<E>>().ok())
        {
            return repository;
        }
        let repository = Arc::new(Repository::<E>::new(
            Arc::clone(&self.store),
            Arc::clone(&self.staged),
        ));
        self.repositories.insert(type_id, repository.clone());
        repository
    }

    /// Number of changes waiting for [`Self::save_changes`].
    pub fn staged_len(&self) -> usize {
        self.lock_staged().len()
    }

    /// Commit every staged change atomically and return the affected row
    /// count. Nothing staged means nothing to do: `Ok(0)` without touching
    /// the store.
    ///
    /// Transient failures and timeouts are retried with exponential backoff
    /// up to the policy's attempt limit. Conflicts fail immediately. On
    /// failure the changes stay staged, ahead of anything staged meanwhile.
    pub async fn save_changes(&self) -> Result<usize, StoreError> {
        let changes = mem::take(&mut *self.lock_staged());
        if changes.is_empty() {
            return Ok(0);
        }
        match self.commit_with_retry(&changes).await {
            Ok(affected) => Ok(affected),
            Err(err) => {
                let mut staged = self.lock_staged();
                let later = mem::replace(&mut *staged, changes);
                staged.extend(later);
                Err(err)
            }
        }
    }

    async fn commit_once(&self, changes: &ChangeSet) -> Result<usize, StoreError> {
        tokio::time::timeout(self.policy.commit_timeout, self.store.commit(changes))
            .await
            .unwrap_or_else(|_| Err(StoreError::timeout()))
    }

    async fn commit_with_retry(&self, changes: &ChangeSet) -> Result<usize, StoreError> {
        let mut attempt = 1;
        let mut backoff = self.policy.initial_backoff;
        loop {
            match self.commit_once(changes).await {
                Ok(affected) => {
                    debug!(affected, attempt, changes = changes.len(), "changes committed");
                    return Ok(affected);
                }
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        attempt,
                        kind = err.kind(),
                        error = %err,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "commit failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2).min(self.policy.max_backoff);
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, kind = err.kind(), error = %err, "commit failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Opens one [`UnitOfWork`] per logical operation.
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    store: Arc<dyn Store>,
    policy: CommitPolicy,
}

impl UnitOfWorkFactory {
    /// Factory over `store` applying `policy` to every session.
    pub fn new(store: Arc<dyn Store>, policy: CommitPolicy) -> Self {
        Self { store, policy }
    }

    /// Open a fresh session.
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store), self.policy)
    }

    /// Commit policy applied to opened sessions.
    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }
}

#[cfg(test)]
#[path = "unit_of_work_tests.rs"]
mod tests;
