//! HTTP API server with observability for the order fulfillment outbox.
//!
//! Exposes the saga triggers as REST endpoints, plus order lookup and outbox
//! inspection and relay, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use outbox::{EventPublisher, OutboxReader, TracingEventBus};
use saga::{InMemoryCreditService, OrderWorkflows, SagaHandlers};
use store::TransactionalStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::{AppState, SharedBus, SharedCredit};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: TransactionalStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/credit-reservations", post(routes::credit::reserve::<S>))
        .route("/reservation-outcomes", post(routes::outcomes::handle::<S>))
        .route("/outbox", get(routes::outbox::list::<S>))
        .route("/outbox/relay", post(routes::outbox::relay::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store, bus and credit service.
pub fn create_state<S: TransactionalStore + Clone + 'static>(
    store: S,
    bus: SharedBus,
    credit: SharedCredit,
    config: &Config,
) -> Arc<AppState<S>> {
    let tables = config.tables();
    let publisher = EventPublisher::new(
        store.clone(),
        bus,
        tables.integration_events.clone(),
        config.publisher(),
    );
    let outbox = OutboxReader::new(store.clone(), tables.integration_events.clone());
    let workflows = OrderWorkflows::new(store, credit, tables);

    Arc::new(AppState {
        handlers: SagaHandlers::new(workflows, publisher),
        outbox,
        stale_claim_age: config.stale_claim_age(),
    })
}

/// Creates the default application state: events are written to the log
/// under the configured bus name and credit comes from an in-memory ledger.
pub fn create_default_state<S: TransactionalStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let bus: SharedBus = Arc::new(TracingEventBus::new(config.event_bus.clone()));
    let credit: SharedCredit = Arc::new(InMemoryCreditService::new(Money::new(
        config.default_credit_limit,
    )));
    create_state(store, bus, credit, config)
}
