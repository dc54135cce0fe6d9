//! Trigger handlers: run a step, then relay its events.

use outbox::{BusEvent, EventBus, EventPublisher, PublishReport};
use serde::Serialize;
use store::TransactionalStore;

use crate::Result;
use crate::events::{OrderPlaced, ReservationOutcome};
use crate::services::CreditService;
use crate::workflows::{
    CreateOrder, HandleReservationOutcome, Invocation, OrderWorkflows, ReserveCredit,
};

/// A handled trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handled {
    #[serde(flatten)]
    pub invocation: Invocation,
    /// Result of the publish pass for the step's correlation id.
    ///
    /// `None` when the pass itself failed; the committed entries stay
    /// `NOT_PUBLISHED` for the next relay pass.
    pub publish: Option<PublishReport>,
}

/// Entry points for the three saga triggers.
///
/// Each handler runs its workflow to completion and then publishes the
/// outbox entries written under that invocation's correlation id. The
/// publish pass is a separate step after the commit; a failure there does
/// not undo the step.
pub struct SagaHandlers<S, B, C> {
    workflows: OrderWorkflows<S, C>,
    publisher: EventPublisher<S, B>,
}

impl<S, B, C> SagaHandlers<S, B, C>
where
    S: TransactionalStore + Clone,
    B: EventBus,
    C: CreditService,
{
    pub fn new(workflows: OrderWorkflows<S, C>, publisher: EventPublisher<S, B>) -> Self {
        Self {
            workflows,
            publisher,
        }
    }

    pub fn workflows(&self) -> &OrderWorkflows<S, C> {
        &self.workflows
    }

    pub fn publisher(&self) -> &EventPublisher<S, B> {
        &self.publisher
    }

    pub async fn create_order(&self, input: CreateOrder) -> Result<Handled> {
        let invocation = self.workflows.create_order(input).await?;
        Ok(self.publish(invocation).await)
    }

    pub async fn reserve_credit(&self, input: ReserveCredit) -> Result<Handled> {
        let invocation = self.workflows.reserve_credit(input).await?;
        Ok(self.publish(invocation).await)
    }

    pub async fn handle_reservation_outcome(
        &self,
        input: HandleReservationOutcome,
    ) -> Result<Handled> {
        let invocation = self.workflows.handle_reservation_outcome(input).await?;
        Ok(self.publish(invocation).await)
    }

    /// Routes a bus event to the step that consumes it.
    ///
    /// `OrderPlaced` triggers the credit check and `ReservationOutcome` the
    /// order resolution. Returns `None` for events no step consumes.
    #[tracing::instrument(skip(self, event), fields(detail_type = %event.detail_type))]
    pub async fn dispatch(&self, event: &BusEvent) -> Result<Option<Handled>> {
        match event.detail_type.as_str() {
            OrderPlaced::NAME => {
                let placed: OrderPlaced = serde_json::from_str(&event.detail)?;
                self.reserve_credit(placed.into()).await.map(Some)
            }
            ReservationOutcome::NAME => {
                let outcome: ReservationOutcome = serde_json::from_str(&event.detail)?;
                self.handle_reservation_outcome(outcome.into())
                    .await
                    .map(Some)
            }
            _ => {
                tracing::debug!("no saga step consumes this event");
                Ok(None)
            }
        }
    }

    async fn publish(&self, invocation: Invocation) -> Handled {
        if invocation.outbox_entries.is_empty() {
            return Handled {
                invocation,
                publish: Some(PublishReport::default()),
            };
        }

        let publish = match self.publisher.publish(invocation.correlation_id).await {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::error!(
                    correlation_id = %invocation.correlation_id,
                    %error,
                    "publish pass failed, entries left for relay"
                );
                None
            }
        };

        Handled {
            invocation,
            publish,
        }
    }
}
