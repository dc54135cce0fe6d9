//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use outbox::{EventBus, OutboxReader};
use saga::{CreditService, SagaHandlers, Tables};
use store::TransactionalStore;

/// Event bus shared by every request.
pub type SharedBus = Arc<dyn EventBus>;

/// Credit service shared by every request.
pub type SharedCredit = Arc<dyn CreditService>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: TransactionalStore + Clone> {
    pub handlers: SagaHandlers<S, SharedBus, SharedCredit>,
    pub outbox: OutboxReader<S>,
    /// Age after which a relay pass releases an `IN_PROGRESS` claim.
    pub stale_claim_age: Duration,
}

impl<S: TransactionalStore + Clone> AppState<S> {
    pub fn store(&self) -> &S {
        self.handlers.workflows().store()
    }

    pub fn tables(&self) -> &Tables {
        self.handlers.workflows().tables()
    }
}
