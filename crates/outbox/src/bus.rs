//! Event bus capability.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// An event as handed to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusEvent {
    /// Configured source tag of the publishing system.
    pub source: String,
    /// Event type tag (the outbox entry name).
    pub detail_type: String,
    /// Serialized event payload.
    pub detail: String,
}

/// A single delivery attempt was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("event rejected by bus: {0}")]
    Rejected(String),

    #[error("event bus unavailable: {0}")]
    Unavailable(String),
}

/// Delivers events to downstream consumers.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Attempts to deliver one event.
    async fn publish(&self, event: BusEvent) -> Result<(), BusError>;
}

#[async_trait]
impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    async fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        (**self).publish(event).await
    }
}

/// In-memory bus that records accepted events.
///
/// Can be told to reject the next `n` deliveries or every delivery, to
/// exercise the publisher's retry and failure handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    published: Arc<RwLock<Vec<BusEvent>>>,
    fail_next: Arc<AtomicU32>,
    fail_always: Arc<AtomicBool>,
    attempts: Arc<AtomicU32>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `n` deliveries.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Rejects every delivery while set.
    pub fn set_fail_always(&self, fail: bool) {
        self.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Returns the accepted events in delivery order.
    pub async fn published(&self) -> Vec<BusEvent> {
        self.published.read().await.clone()
    }

    /// Returns the number of delivery attempts, accepted or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Forgets recorded events and attempts.
    pub async fn clear(&self) {
        self.published.write().await.clear();
        self.attempts.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_always.load(Ordering::SeqCst) {
            return Err(BusError::Unavailable("bus configured to fail".to_string()));
        }
        let rejected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(BusError::Rejected(format!(
                "{} rejected by test bus",
                event.detail_type
            )));
        }

        self.published.write().await.push(event);
        Ok(())
    }
}

/// Bus that writes each event to the log under a named bus.
///
/// Stands in for a broker when the service runs without one.
#[derive(Debug, Clone)]
pub struct TracingEventBus {
    bus_name: String,
}

impl TracingEventBus {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
        }
    }
}

#[async_trait]
impl EventBus for TracingEventBus {
    async fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        tracing::info!(
            bus = %self.bus_name,
            source = %event.source,
            detail_type = %event.detail_type,
            detail = %event.detail,
            "integration event published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(detail_type: &str) -> BusEvent {
        BusEvent {
            source: "orders".to_string(),
            detail_type: detail_type.to_string(),
            detail: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn records_accepted_events() {
        let bus = InMemoryEventBus::new();
        bus.publish(event("A")).await.unwrap();
        bus.publish(event("B")).await.unwrap();

        let published = bus.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].detail_type, "A");
        assert_eq!(bus.attempts(), 2);
    }

    #[tokio::test]
    async fn fail_next_rejects_exactly_n_attempts() {
        let bus = InMemoryEventBus::new();
        bus.fail_next(2);

        assert!(matches!(bus.publish(event("A")).await, Err(BusError::Rejected(_))));
        assert!(bus.publish(event("A")).await.is_err());
        assert!(bus.publish(event("A")).await.is_ok());
        assert_eq!(bus.published().await.len(), 1);
        assert_eq!(bus.attempts(), 3);
    }

    #[tokio::test]
    async fn fail_always_rejects_until_cleared() {
        let bus = InMemoryEventBus::new();
        bus.set_fail_always(true);
        assert!(matches!(
            bus.publish(event("A")).await,
            Err(BusError::Unavailable(_))
        ));

        bus.set_fail_always(false);
        assert!(bus.publish(event("A")).await.is_ok());
    }

    #[tokio::test]
    async fn shared_bus_delivers_through_arc() {
        let bus = Arc::new(InMemoryEventBus::new());
        let shared: Arc<dyn EventBus> = bus.clone();
        shared.publish(event("A")).await.unwrap();
        assert_eq!(bus.published().await.len(), 1);
    }

    #[tokio::test]
    async fn tracing_bus_accepts_everything() {
        let bus = TracingEventBus::new("integration-events");
        assert!(bus.publish(event("A")).await.is_ok());
    }
}
