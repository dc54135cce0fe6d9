//! Outbox inspection and relay endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::CorrelationId;
use outbox::{OutboxEntry, OutboxStatus, PublishReport};
use serde::{Deserialize, Serialize};
use store::TransactionalStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxQuery {
    pub status: Option<String>,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Correlation ids whose stale claims were released.
    pub released: Vec<CorrelationId>,
    #[serde(flatten)]
    pub report: PublishReport,
}

/// GET /outbox — list entries by status and correlation id.
#[tracing::instrument(skip(state))]
pub async fn list<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<OutboxQuery>,
) -> Result<Json<Vec<OutboxEntry>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OutboxStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let correlation_id = query
        .correlation_id
        .as_deref()
        .map(str::parse::<CorrelationId>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("Invalid correlationId: {e}")))?;

    Ok(Json(state.outbox.entries(status, correlation_id).await?))
}

/// POST /outbox/relay — release stale claims and publish everything pending.
#[tracing::instrument(skip(state))]
pub async fn relay<S: TransactionalStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RelayResponse>, ApiError> {
    let publisher = state.handlers.publisher();
    let released = publisher.reap_stale(state.stale_claim_age).await?;
    let report = publisher.publish_pending().await?;
    Ok(Json(RelayResponse { released, report }))
}
