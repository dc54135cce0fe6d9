//! Credit reservation trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::{Handled, ReserveCredit};
use store::TransactionalStore;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /credit-reservations — check credit and publish `ReservationOutcome`.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn reserve<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReserveCredit>,
) -> Result<Json<Handled>, ApiError> {
    Ok(Json(state.handlers.reserve_credit(req).await?))
}
