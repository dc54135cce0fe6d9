//! HTTP route handlers.

pub mod credit;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod outbox;
pub mod outcomes;
