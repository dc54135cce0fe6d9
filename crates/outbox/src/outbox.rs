//! Writing integration events into a unit of work.

use chrono::Utc;
use common::EntityId;
use domain::UnitOfWork;
use serde::Serialize;
use store::{TransactionalStore, WriteOp};

use crate::Result;
use crate::entry::{IntegrationEvent, OutboxEntry};

/// Registers integration events as outbox entries.
///
/// Entries are added to the borrowed unit of work, so they are committed
/// atomically with whatever entity changes the same unit of work carries. An
/// entry exists in storage if and only if that commit succeeded.
pub struct IntegrationEventOutbox<'a, S: TransactionalStore> {
    table: String,
    uow: &'a UnitOfWork<S>,
}

impl<'a, S: TransactionalStore> IntegrationEventOutbox<'a, S> {
    /// Creates an outbox writing to `table` through `uow`.
    pub fn new(table: impl Into<String>, uow: &'a UnitOfWork<S>) -> Self {
        Self {
            table: table.into(),
            uow,
        }
    }

    /// Registers an event and returns the id of its outbox entry.
    ///
    /// The entry is stamped with the unit of work's correlation id and starts
    /// out `NOT_PUBLISHED`.
    #[tracing::instrument(skip(self, event), fields(table = %self.table, name = %event.name))]
    pub fn add<T: Serialize>(&self, event: IntegrationEvent<T>) -> Result<EntityId> {
        let payload = serde_json::to_string(&event.payload)?;
        let entry = OutboxEntry::new(event.name, payload, self.uow.correlation_id(), Utc::now());
        let document = serde_json::to_value(&entry)?;

        self.uow
            .register([WriteOp::insert(&self.table, entry.id.as_str(), document)]);
        tracing::debug!(entry_id = %entry.id, "integration event added to outbox");

        Ok(entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::OutboxStatus;
    use serde_json::json;
    use store::{InMemoryStore, TransactionalStore};

    #[tokio::test]
    async fn entry_is_invisible_until_commit() {
        let store = InMemoryStore::new();
        let uow = UnitOfWork::new(store.clone());
        let outbox = IntegrationEventOutbox::new("events", &uow);

        let id = outbox
            .add(IntegrationEvent::new("OrderPlaced", json!({"amount": 10})))
            .unwrap();
        assert!(store.get("events", id.as_str()).await.unwrap().is_none());

        let correlation_id = uow.correlation_id();
        uow.commit().await.unwrap();

        let doc = store.get("events", id.as_str()).await.unwrap().unwrap();
        let entry: OutboxEntry = serde_json::from_value(doc).unwrap();
        assert_eq!(entry.name, "OrderPlaced");
        assert_eq!(entry.payload, r#"{"amount":10}"#);
        assert_eq!(entry.status, OutboxStatus::NotPublished);
        assert_eq!(entry.correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_entry() {
        let store = InMemoryStore::new();
        store.set_fail_on_transact(true);
        let uow = UnitOfWork::new(store.clone());
        let outbox = IntegrationEventOutbox::new("events", &uow);

        outbox
            .add(IntegrationEvent::new("OrderPlaced", json!({})))
            .unwrap();
        assert!(uow.commit().await.is_err());

        store.set_fail_on_transact(false);
        assert_eq!(store.item_count("events").await, 0);
    }

    #[tokio::test]
    async fn each_add_registers_a_distinct_entry() {
        let store = InMemoryStore::new();
        let uow = UnitOfWork::new(store.clone());
        let outbox = IntegrationEventOutbox::new("events", &uow);

        let first = outbox.add(IntegrationEvent::new("A", json!(1))).unwrap();
        let second = outbox.add(IntegrationEvent::new("B", json!(2))).unwrap();
        assert_ne!(first, second);
        assert_eq!(uow.pending(), 2);
    }
}
