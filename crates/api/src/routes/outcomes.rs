//! Reservation outcome trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::{HandleReservationOutcome, Handled};
use store::TransactionalStore;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /reservation-outcomes — resolve the order named by the outcome.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn handle<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<HandleReservationOutcome>,
) -> Result<Json<Handled>, ApiError> {
    Ok(Json(state.handlers.handle_reservation_outcome(req).await?))
}
