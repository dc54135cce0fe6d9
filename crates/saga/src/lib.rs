//! Order saga: place an order, reserve credit, resolve the order.
//!
//! The saga is choreographed through integration events:
//! 1. `create_order` stores a pending order and emits `OrderPlaced`
//! 2. `reserve_credit` asks the credit service, records a transaction when
//!    credit was reserved, and always emits `ReservationOutcome`
//! 3. `handle_reservation_outcome` moves the order to `CREATED` or `REJECTED`
//!
//! Each step commits its entity changes and outbox entries in one unit of
//! work. [`SagaHandlers`] wrap the steps with the publish pass that relays
//! the step's events.

pub mod error;
pub mod events;
pub mod handlers;
pub mod services;
pub mod tables;
pub mod workflows;

pub use error::{Result, SagaError};
pub use events::{OrderPlaced, ReservationOutcome};
pub use handlers::{Handled, SagaHandlers};
pub use services::{CreditService, FixedCreditService, InMemoryCreditService};
pub use tables::Tables;
pub use workflows::{
    CreateOrder, HandleReservationOutcome, Invocation, OrderWorkflows, ReserveCredit, Step,
};
