//! Saga steps, each one unit of work.

use common::{CorrelationId, EntityId};
use domain::{
    CustomerId, DomainError, Money, Order, OrderError, Repository, Transaction, UnitOfWork,
};
use outbox::{IntegrationEvent, IntegrationEventOutbox};
use serde::{Deserialize, Serialize};
use store::TransactionalStore;

use crate::Result;
use crate::events::{OrderPlaced, ReservationOutcome};
use crate::services::CreditService;
use crate::tables::Tables;

/// Input of [`OrderWorkflows::create_order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub amount: Money,
    pub customer_id: CustomerId,
}

/// Input of [`OrderWorkflows::reserve_credit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveCredit {
    pub amount: Money,
    pub order_id: EntityId,
    pub customer_id: CustomerId,
}

impl From<OrderPlaced> for ReserveCredit {
    fn from(event: OrderPlaced) -> Self {
        Self {
            amount: event.amount,
            order_id: event.order_id,
            customer_id: event.customer_id,
        }
    }
}

/// Input of [`OrderWorkflows::handle_reservation_outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleReservationOutcome {
    pub order_id: EntityId,
    pub is_credit_reserved: bool,
}

impl From<ReservationOutcome> for HandleReservationOutcome {
    fn from(event: ReservationOutcome) -> Self {
        Self {
            order_id: event.order_id,
            is_credit_reserved: event.is_credit_reserved,
        }
    }
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// A pending order was stored.
    #[serde(rename_all = "camelCase")]
    OrderCreated { order: Order },

    /// Credit was checked; a transaction exists only if it was reserved.
    #[serde(rename_all = "camelCase")]
    CreditChecked {
        is_credit_reserved: bool,
        transaction: Option<Transaction>,
    },

    /// The order reached its terminal status.
    #[serde(rename_all = "camelCase")]
    OrderResolved { order: Order },

    /// The order had already been resolved; nothing changed.
    #[serde(rename_all = "camelCase")]
    AlreadyResolved { order: Order },

    /// No order with this id exists; nothing changed.
    OrderMissing,
}

/// Result of one saga step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Correlation id of the step's unit of work and outbox entries.
    pub correlation_id: CorrelationId,
    pub order_id: EntityId,
    #[serde(flatten)]
    pub step: Step,
    /// Ids of the outbox entries the step committed.
    pub outbox_entries: Vec<EntityId>,
}

/// The three saga steps over a store and a credit service.
pub struct OrderWorkflows<S, C> {
    store: S,
    credit: C,
    tables: Tables,
}

impl<S, C> OrderWorkflows<S, C>
where
    S: TransactionalStore + Clone,
    C: CreditService,
{
    pub fn new(store: S, credit: C, tables: Tables) -> Self {
        Self {
            store,
            credit,
            tables,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores a pending order and emits `OrderPlaced`.
    #[tracing::instrument(skip(self, input), fields(customer_id = %input.customer_id, amount = %input.amount))]
    pub async fn create_order(&self, input: CreateOrder) -> Result<Invocation> {
        let uow = UnitOfWork::new(self.store.clone());
        let orders = Repository::<Order, _>::new(&self.tables.orders, &uow);
        let outbox = IntegrationEventOutbox::new(&self.tables.integration_events, &uow);

        let mut order = Order::place(input.customer_id, input.amount).map_err(DomainError::from)?;
        orders.add(&mut order)?;
        let entry_id = outbox.add(IntegrationEvent::new(
            OrderPlaced::NAME,
            OrderPlaced::from(&order),
        ))?;

        let correlation_id = uow.correlation_id();
        uow.commit().await?;

        metrics::counter!("saga_orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, %correlation_id, "order created");

        Ok(Invocation {
            correlation_id,
            order_id: order.id.clone(),
            step: Step::OrderCreated { order },
            outbox_entries: vec![entry_id],
        })
    }

    /// Checks credit for an order and emits `ReservationOutcome`.
    ///
    /// A transaction is recorded only when credit was reserved; the outcome
    /// event is emitted either way.
    #[tracing::instrument(skip(self, input), fields(order_id = %input.order_id, amount = %input.amount))]
    pub async fn reserve_credit(&self, input: ReserveCredit) -> Result<Invocation> {
        if !input.amount.is_positive() {
            return Err(DomainError::from(OrderError::InvalidAmount {
                amount: input.amount,
            })
            .into());
        }

        let is_credit_reserved = self
            .credit
            .reserve(&input.customer_id, &input.order_id, input.amount)
            .await?;

        let uow = UnitOfWork::new(self.store.clone());
        let transactions = Repository::<Transaction, _>::new(&self.tables.transactions, &uow);
        let outbox = IntegrationEventOutbox::new(&self.tables.integration_events, &uow);

        let transaction = if is_credit_reserved {
            let mut transaction =
                Transaction::outcome(input.order_id.clone(), input.customer_id, input.amount);
            transactions.add(&mut transaction)?;
            Some(transaction)
        } else {
            None
        };

        let entry_id = outbox.add(IntegrationEvent::new(
            ReservationOutcome::NAME,
            ReservationOutcome {
                is_credit_reserved,
                order_id: input.order_id.clone(),
            },
        ))?;

        let correlation_id = uow.correlation_id();
        uow.commit().await?;

        metrics::counter!("saga_credit_checks_total", "reserved" => is_credit_reserved.to_string())
            .increment(1);
        tracing::info!(is_credit_reserved, %correlation_id, "credit checked");

        Ok(Invocation {
            correlation_id,
            order_id: input.order_id,
            step: Step::CreditChecked {
                is_credit_reserved,
                transaction,
            },
            outbox_entries: vec![entry_id],
        })
    }

    /// Resolves a pending order from a reservation outcome.
    ///
    /// A missing order or an order that is already resolved is logged and
    /// left alone, so redelivered outcomes are absorbed.
    #[tracing::instrument(skip(self, input), fields(order_id = %input.order_id, is_credit_reserved = input.is_credit_reserved))]
    pub async fn handle_reservation_outcome(
        &self,
        input: HandleReservationOutcome,
    ) -> Result<Invocation> {
        let uow = UnitOfWork::new(self.store.clone());
        let correlation_id = uow.correlation_id();
        let orders = Repository::<Order, _>::new(&self.tables.orders, &uow);

        let Some(mut order) = orders.get(&input.order_id).await? else {
            tracing::warn!("order not found, ignoring reservation outcome");
            return Ok(Invocation {
                correlation_id,
                order_id: input.order_id,
                step: Step::OrderMissing,
                outbox_entries: Vec::new(),
            });
        };

        if order.status.is_terminal() {
            tracing::info!(status = %order.status, "order already resolved, ignoring reservation outcome");
            return Ok(Invocation {
                correlation_id,
                order_id: input.order_id,
                step: Step::AlreadyResolved { order },
                outbox_entries: Vec::new(),
            });
        }

        let status = order
            .resolve(input.is_credit_reserved)
            .map_err(DomainError::from)?;
        orders.update(&mut order)?;
        uow.commit().await?;

        metrics::counter!("saga_orders_resolved_total", "status" => status.as_str()).increment(1);
        tracing::info!(%status, version = %order.version, "order resolved");

        Ok(Invocation {
            correlation_id,
            order_id: input.order_id,
            step: Step::OrderResolved { order },
            outbox_entries: Vec::new(),
        })
    }
}
