//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{Order, Repository, UnitOfWork};
use saga::{CreateOrder, Handled};
use store::TransactionalStore;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /orders — place a pending order and publish `OrderPlaced`.
#[tracing::instrument(skip(state, req), fields(customer_id = %req.customer_id))]
pub async fn create<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Handled>), ApiError> {
    let handled = state.handlers.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(handled)))
}

/// GET /orders/{id} — read an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let uow = UnitOfWork::new(state.store().clone());
    let orders = Repository::<Order, _>::new(&state.tables().orders, &uow);

    orders
        .get(&EntityId::from(id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}
