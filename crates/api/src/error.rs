//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use outbox::OutboxError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga step error.
    Saga(SagaError),
    /// Outbox read or relay error.
    Outbox(OutboxError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => (domain_status(&err), err.to_string()),
            ApiError::Saga(err) => (saga_status(&err), err.to_string()),
            ApiError::Outbox(err) => (outbox_status(&err), err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Conflict { .. } => StatusCode::CONFLICT,
        DomainError::Order(OrderError::InvalidStatusTransition { .. }) => StatusCode::CONFLICT,
        DomainError::Order(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn outbox_status(err: &OutboxError) -> StatusCode {
    match err {
        OutboxError::Domain(err) => domain_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn saga_status(err: &SagaError) -> StatusCode {
    match err {
        SagaError::Domain(err) => domain_status(err),
        SagaError::Outbox(err) => outbox_status(err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<OutboxError> for ApiError {
    fn from(err: OutboxError) -> Self {
        ApiError::Outbox(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    #[test]
    fn test_conflict_maps_to_409() {
        let err = SagaError::Domain(DomainError::Conflict {
            table: "orders".to_string(),
            id: "o1".to_string(),
        });
        assert_eq!(saga_status(&err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = SagaError::Domain(DomainError::Order(OrderError::InvalidAmount {
            amount: Money::new(-1),
        }));
        assert_eq!(saga_status(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err = SagaError::CreditService("down".to_string());
        assert_eq!(saga_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
