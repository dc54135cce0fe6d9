//! Order entity and related types.

mod entity;
mod state;
mod value_objects;

pub use entity::Order;
pub use state::OrderStatus;
pub use value_objects::{CustomerId, Money};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Customer ID is required.
    #[error("Customer ID is required")]
    CustomerIdRequired,

    /// Order amounts must be positive.
    #[error("Invalid amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: Money },

    /// Order is not in the expected status.
    #[error("Invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: OrderStatus,
        action: &'static str,
    },
}
