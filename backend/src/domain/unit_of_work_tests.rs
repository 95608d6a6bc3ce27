//! Tests for repository identity, commit retries, and timeouts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::domain::ports::{MockStore, Snapshot};
use crate::domain::test_fixtures::{subject, user};
use crate::domain::{Role, Subject, User};
use crate::outbound::persistence::MemoryStore;
use rstest::rstest;

fn fast_policy(max_attempts: u32) -> CommitPolicy {
    CommitPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
        commit_timeout: Duration::from_millis(100),
    }
}

fn with_store(store: MockStore, policy: CommitPolicy) -> UnitOfWork {
    UnitOfWork::new(Arc::new(store), policy)
}

#[rstest]
fn repository_is_created_once_per_type() {
    let mut uow = UnitOfWork::new(Arc::new(MemoryStore::new()), CommitPolicy::default());

    let first = uow.repository::<Subject>();
    let second = uow.repository::<Subject>();
    let users = uow.repository::<User>();
    let users_again = uow.repository::<User>();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&users, &users_again));
}

#[rstest]
#[tokio::test]
async fn empty_session_never_touches_the_store() {
    let mut store = MockStore::new();
    store.expect_commit().times(0);
    let uow = with_store(store, fast_policy(3));

    assert_eq!(uow.save_changes().await.expect("save"), 0);
}

#[rstest]
#[tokio::test]
async fn changes_from_every_repository_commit_together() {
    let mut store = MockStore::new();
    store
        .expect_commit()
        .withf(|changes| changes.len() == 2)
        .times(1)
        .returning(|changes| Ok(changes.len()));
    let mut uow = with_store(store, fast_policy(1));

    uow.repository::<Subject>().add(subject("BIS101", 1));
    uow.repository::<User>().add(user("D01", Role::Doctor));

    assert_eq!(uow.save_changes().await.expect("save"), 2);
    assert_eq!(uow.staged_len(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let mut store = MockStore::new();
    let mut calls = 0_u32;
    store.expect_commit().times(3).returning(move |_| {
        calls += 1;
        if calls < 3 {
            Err(StoreError::transient("connection reset"))
        } else {
            Ok(1)
        }
    });
    let mut uow = with_store(store, fast_policy(3));
    uow.repository::<Subject>().add(subject("BIS101", 1));

    assert_eq!(uow.save_changes().await.expect("third attempt succeeds"), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn exhausted_retries_keep_changes_staged() {
    let mut store = MockStore::new();
    store
        .expect_commit()
        .times(2)
        .returning(|_| Err(StoreError::transient("connection reset")));
    let mut uow = with_store(store, fast_policy(2));
    uow.repository::<Subject>().add(subject("BIS101", 1));

    let err = uow.save_changes().await.expect_err("retries exhausted");

    assert_eq!(err.kind(), "transient");
    assert_eq!(uow.staged_len(), 1);
}

#[rstest]
#[tokio::test]
async fn conflicts_are_not_retried() {
    let mut store = MockStore::new();
    store
        .expect_commit()
        .times(1)
        .returning(|_| Err(StoreError::conflict("subjects with key \"BIS101\" already exists")));
    let mut uow = with_store(store, fast_policy(5));
    uow.repository::<Subject>().add(subject("BIS101", 1));

    let err = uow.save_changes().await.expect_err("conflict");
    assert_eq!(err.kind(), "conflict");
}

struct StalledStore;

#[async_trait]
impl Store for StalledStore {
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot::default())
    }

    async fn commit(&self, _changes: &ChangeSet) -> Result<usize, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(1)
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_commits_time_out() {
    let mut uow = UnitOfWork::new(Arc::new(StalledStore), fast_policy(2));
    uow.repository::<Subject>().add(subject("BIS101", 1));

    let err = uow.save_changes().await.expect_err("timed out");

    assert_eq!(err, StoreError::timeout());
    assert_eq!(uow.staged_len(), 1);
}

#[rstest]
#[tokio::test]
async fn factory_opens_independent_sessions() {
    let factory = UnitOfWorkFactory::new(Arc::new(MemoryStore::new()), CommitPolicy::default());
    let mut first = factory.begin();
    let mut second = factory.begin();

    first.repository::<Subject>().add(subject("BIS101", 1));

    assert_eq!(second.save_changes().await.expect("nothing staged"), 0);
    assert_eq!(first.save_changes().await.expect("save"), 1);
    let stored = second
        .repository::<Subject>()
        .get_all()
        .await
        .expect("read");
    assert_eq!(stored.len(), 1);
}
