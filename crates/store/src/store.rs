use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, ScanFilter, StoreError, WriteOp};

/// Core trait for transactional item stores.
///
/// A store keeps JSON documents grouped by table and keyed by id.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Applies a batch of conditional writes atomically.
    ///
    /// Either every operation is applied or none is. If the precondition of
    /// any operation fails the whole batch is rejected with
    /// [`StoreError::ConditionFailed`] naming the first failing operation.
    /// An empty batch succeeds without effect.
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Looks up a single item.
    ///
    /// Returns None if no item with this id exists in the table.
    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>>;

    /// Returns every item of the table matching the filter.
    async fn scan(&self, table: &str, filter: &ScanFilter) -> Result<Vec<Value>>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait TransactionalStoreExt: TransactionalStore {
    /// Applies a single conditional write.
    async fn write(&self, op: WriteOp) -> Result<()> {
        self.transact(vec![op]).await
    }

    /// Checks whether an item exists.
    async fn exists(&self, table: &str, id: &str) -> Result<bool> {
        Ok(self.get(table, id).await?.is_some())
    }
}

// Blanket implementation for all TransactionalStore implementations
impl<T: TransactionalStore + ?Sized> TransactionalStoreExt for T {}

/// Validates a batch before it is applied.
///
/// A batch may touch each item at most once, and documents written by a put
/// must be JSON objects.
pub fn validate_batch(ops: &[WriteOp]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ops.len());
    for op in ops {
        if !seen.insert((op.table.as_str(), op.id.as_str())) {
            return Err(StoreError::InvalidBatch(format!(
                "item {}/{} is written more than once",
                op.table, op.id
            )));
        }
        if let crate::WriteAction::Put(document) = &op.action
            && !document.is_object()
        {
            return Err(StoreError::InvalidBatch(format!(
                "document for {}/{} is not an object",
                op.table, op.id
            )));
        }
    }
    Ok(())
}
