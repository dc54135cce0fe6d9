//! Domain layer for the order fulfillment outbox.
//!
//! This crate provides:
//! - [`Entity`] trait for versioned records with a declared update schema
//! - [`UnitOfWork`] batching conditional writes into one atomic commit
//! - [`Repository`] translating add/update into unit-of-work operations
//! - Order and Transaction entities with the order status state machine

pub mod entity;
pub mod error;
pub mod order;
pub mod repository;
pub mod transaction;
pub mod unit_of_work;

pub use entity::Entity;
pub use error::DomainError;
pub use order::{CustomerId, Money, Order, OrderError, OrderStatus};
pub use repository::Repository;
pub use transaction::{Transaction, TransactionKind};
pub use unit_of_work::UnitOfWork;
