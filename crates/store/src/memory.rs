use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Result, ScanFilter, StoreError, WriteOp,
    store::{TransactionalStore, validate_batch},
};

type Tables = HashMap<String, BTreeMap<String, Value>>;

/// In-memory item store for tests and local runs.
///
/// A single write lock is held for the whole batch, so conditions are checked
/// and writes applied against one consistent view, matching the atomicity of
/// the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_on_transact: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject every batch with a backend error.
    pub fn set_fail_on_transact(&self, fail: bool) {
        self.fail_on_transact.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of items stored in a table.
    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<()> {
        validate_batch(&ops)?;

        if self.fail_on_transact.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "transaction rejected by backend".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;

        // Each item appears at most once, so checking every condition against
        // the pre-batch state is equivalent to checking them in order.
        for (index, op) in ops.iter().enumerate() {
            let current = tables.get(&op.table).and_then(|t| t.get(&op.id));
            if !op.preconditions_hold(current) {
                tracing::debug!(table = %op.table, id = %op.id, index, "write condition failed");
                metrics::counter!("store_condition_failures_total").increment(1);
                return Err(StoreError::ConditionFailed {
                    table: op.table.clone(),
                    id: op.id.clone(),
                    index,
                });
            }
        }

        for op in ops {
            let table = tables.entry(op.table.clone()).or_default();
            let document = op.apply_to(table.get(&op.id));
            table.insert(op.id, document);
        }

        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|t| t.get(id)).cloned())
    }

    async fn scan(&self, table: &str, filter: &ScanFilter) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        let items = tables
            .get(table)
            .map(|t| t.values().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();
        Ok(items)
    }
}
