//! Integration event outbox.
//!
//! Events destined for other systems are written as outbox entries in the
//! same atomic commit as the entity changes that caused them. A publisher
//! then relays committed entries to an event bus, at least once, tracking
//! each entry's delivery status in the store.
//!
//! - [`IntegrationEventOutbox`] registers entries into a [`domain::UnitOfWork`]
//! - [`EventPublisher`] claims, delivers and settles entries with bounded retries
//! - [`OutboxReader`] lists entries for inspection and remediation
//! - [`EventBus`] is the delivery capability, with an in-memory and a tracing sink

pub mod bus;
pub mod entry;
pub mod error;
pub mod outbox;
pub mod publisher;
pub mod reader;
pub mod retry;

pub use bus::{BusError, BusEvent, EventBus, InMemoryEventBus, TracingEventBus};
pub use entry::{IntegrationEvent, OutboxEntry, OutboxStatus};
pub use error::{OutboxError, Result};
pub use outbox::IntegrationEventOutbox;
pub use publisher::{EventPublisher, PublishReport, PublisherConfig};
pub use reader::OutboxReader;
pub use retry::{RetryPolicy, retry_with_backoff};
