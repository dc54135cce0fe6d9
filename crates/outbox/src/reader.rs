//! Read access to outbox entries.

use common::{CorrelationId, EntityId};
use store::{ScanFilter, TransactionalStore};

use crate::Result;
use crate::entry::{CORRELATION_ID_FIELD, OutboxEntry, OutboxStatus, STATUS_FIELD};

/// Lists outbox entries, e.g. to find `FAILED` ones for remediation.
pub struct OutboxReader<S> {
    store: S,
    table: String,
}

impl<S: TransactionalStore> OutboxReader<S> {
    pub fn new(store: S, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Returns entries matching the given status and correlation id, oldest first.
    ///
    /// Omitted criteria match everything.
    pub async fn entries(
        &self,
        status: Option<OutboxStatus>,
        correlation_id: Option<CorrelationId>,
    ) -> Result<Vec<OutboxEntry>> {
        let mut filter = ScanFilter::new();
        if let Some(status) = status {
            filter = filter.where_eq(STATUS_FIELD, status.as_str());
        }
        if let Some(correlation_id) = correlation_id {
            filter = filter.where_eq(CORRELATION_ID_FIELD, correlation_id.to_string());
        }

        let mut entries = self
            .store
            .scan(&self.table, &filter)
            .await?
            .into_iter()
            .map(serde_json::from_value::<OutboxEntry>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// Looks up one entry by id.
    pub async fn get(&self, id: &EntityId) -> Result<Option<OutboxEntry>> {
        match self.store.get(&self.table, id.as_str()).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }
}
