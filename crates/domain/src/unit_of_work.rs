//! Unit of work: one atomic commit per workflow invocation.

use std::sync::{Mutex, PoisonError};

use common::CorrelationId;
use store::{StoreError, TransactionalStore, WriteOp};

use crate::error::DomainError;

/// Accumulates conditional writes and commits them as one atomic batch.
///
/// A unit of work belongs to exactly one workflow invocation. Repositories
/// and the outbox borrow it to register operations; nothing reaches the store
/// until [`commit`](Self::commit), which consumes the unit of work so it can
/// never be reused.
///
/// Every unit of work mints a [`CorrelationId`] on creation. Outbox entries
/// written through it carry that id so a later publish pass can select
/// exactly this invocation's events.
pub struct UnitOfWork<S: TransactionalStore> {
    store: S,
    correlation_id: CorrelationId,
    operations: Mutex<Vec<WriteOp>>,
}

impl<S: TransactionalStore> UnitOfWork<S> {
    /// Opens a new unit of work against the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            correlation_id: CorrelationId::new(),
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Returns the correlation id shared by everything registered here.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Returns the backing store for direct reads.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends write operations to the pending batch.
    ///
    /// Has no effect on the store until commit.
    pub fn register(&self, ops: impl IntoIterator<Item = WriteOp>) {
        let mut operations = self
            .operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for op in ops {
            tracing::debug!(
                correlation_id = %self.correlation_id,
                table = %op.table,
                id = %op.id,
                "operation added to unit of work"
            );
            operations.push(op);
        }
    }

    /// Returns the number of registered operations.
    pub fn pending(&self) -> usize {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Commits every registered operation atomically.
    ///
    /// On failure nothing was applied: a failed precondition surfaces as
    /// [`DomainError::Conflict`], any other backend failure as
    /// [`DomainError::Commit`].
    #[tracing::instrument(skip(self), fields(correlation_id = %self.correlation_id))]
    pub async fn commit(self) -> Result<(), DomainError> {
        let operations = self
            .operations
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        if operations.is_empty() {
            tracing::debug!("nothing to commit");
            return Ok(());
        }

        let count = operations.len();
        match self.store.transact(operations).await {
            Ok(()) => {
                metrics::counter!("uow_commits_total").increment(1);
                tracing::info!(operations = count, "unit of work committed");
                Ok(())
            }
            Err(StoreError::ConditionFailed { table, id, index }) => {
                metrics::counter!("uow_commit_conflicts_total").increment(1);
                tracing::warn!(%table, %id, index, "unit of work commit conflicted");
                Err(DomainError::Conflict { table, id })
            }
            Err(e) => {
                metrics::counter!("uow_commit_failures_total").increment(1);
                tracing::error!(error = %e, "error committing unit of work");
                Err(DomainError::Commit(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::InMemoryStore;

    #[tokio::test]
    async fn register_has_no_effect_until_commit() {
        let store = InMemoryStore::new();
        let uow = UnitOfWork::new(store.clone());

        uow.register([WriteOp::insert("orders", "o1", json!({"id": "o1"}))]);
        assert_eq!(uow.pending(), 1);
        assert_eq!(store.item_count("orders").await, 0);

        uow.commit().await.unwrap();
        assert_eq!(store.item_count("orders").await, 1);
    }

    #[tokio::test]
    async fn each_unit_of_work_has_its_own_correlation_id() {
        let store = InMemoryStore::new();
        let a = UnitOfWork::new(store.clone());
        let b = UnitOfWork::new(store);
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[tokio::test]
    async fn empty_commit_succeeds() {
        let store = InMemoryStore::new();
        store.set_fail_on_transact(true);
        UnitOfWork::new(store).commit().await.unwrap();
    }

    #[tokio::test]
    async fn failed_condition_becomes_conflict() {
        let store = InMemoryStore::new();
        let first = UnitOfWork::new(store.clone());
        first.register([WriteOp::insert("orders", "o1", json!({"id": "o1"}))]);
        first.commit().await.unwrap();

        let second = UnitOfWork::new(store.clone());
        second.register([
            WriteOp::insert("events", "e1", json!({"id": "e1"})),
            WriteOp::insert("orders", "o1", json!({"id": "o1"})),
        ]);
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict { ref table, ref id } if table == "orders" && id == "o1"));
        assert!(err.is_commit_failure());
        assert_eq!(store.item_count("events").await, 0);
    }

    #[tokio::test]
    async fn backend_failure_becomes_commit_error() {
        let store = InMemoryStore::new();
        store.set_fail_on_transact(true);

        let uow = UnitOfWork::new(store.clone());
        uow.register([WriteOp::insert("orders", "o1", json!({"id": "o1"}))]);
        let err = uow.commit().await.unwrap_err();

        assert!(matches!(err, DomainError::Commit(StoreError::Backend(_))));
        assert!(!err.is_conflict());
        assert_eq!(store.item_count("orders").await, 0);
    }
}
