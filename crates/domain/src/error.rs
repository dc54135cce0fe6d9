//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A write precondition in the committed batch failed: a stale version,
    /// an insert of an existing item, or an update of a missing one.
    /// Nothing in the batch was applied.
    #[error("Concurrency conflict on {table}/{id}")]
    Conflict { table: String, id: String },

    /// The backend rejected the commit. Nothing in the batch was applied.
    #[error("Commit failed: {0}")]
    Commit(StoreError),

    /// A read against the store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the order entity.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The entity kind declares no updatable fields.
    #[error("{kind} entities are immutable")]
    Immutable { kind: &'static str },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if this error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict { .. })
    }

    /// Returns true if a unit of work commit failed (conflict or backend).
    pub fn is_commit_failure(&self) -> bool {
        matches!(self, DomainError::Conflict { .. } | DomainError::Commit(_))
    }
}
