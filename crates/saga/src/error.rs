//! Saga error types.

use domain::DomainError;
use outbox::OutboxError;
use thiserror::Error;

/// Errors that can occur while running a saga step.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Validation, persistence or commit failure of the step's entities.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The step's integration events could not be written or relayed.
    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),

    /// The credit service could not make a decision.
    #[error("Credit service error: {0}")]
    CreditService(String),

    /// An inbound event could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SagaError {
    /// Returns true if the step lost an optimistic concurrency race.
    pub fn is_conflict(&self) -> bool {
        match self {
            SagaError::Domain(error) => error.is_conflict(),
            SagaError::Outbox(OutboxError::Domain(error)) => error.is_conflict(),
            _ => false,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
