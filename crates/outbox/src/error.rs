//! Outbox error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while writing or relaying outbox entries.
///
/// Delivery failures of individual entries are not errors of a publish
/// pass; they are recorded on the entry and in the [`PublishReport`].
///
/// [`PublishReport`]: crate::PublishReport
#[derive(Debug, Error)]
pub enum OutboxError {
    /// The outbox table could not be read or written.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The owning unit of work rejected the entry.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A payload or stored entry could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;
