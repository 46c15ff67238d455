//! HTTP API server for the recycle ledger.
//!
//! Exposes manufacturer registration, product and item lifecycle endpoints,
//! and read-model queries, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{LedgerConfig, LedgerService};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{
    ManufacturerProductsView, Projection, ProductItemsView, ProjectionProcessor,
    StatusHistoryView,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/manufacturers", post(routes::manufacturers::register::<S>))
        .route("/manufacturers/{id}", get(routes::manufacturers::get::<S>))
        .route(
            "/manufacturers/{id}/products",
            get(routes::manufacturers::products::<S>),
        )
        .route("/products", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route(
            "/products/{id}/items",
            post(routes::products::add_items::<S>).get(routes::products::list_items::<S>),
        )
        .route("/products/{id}/summary", get(routes::products::summary::<S>))
        .route("/items/sell", post(routes::items::sell::<S>))
        .route("/items/return", post(routes::items::return_items::<S>))
        .route("/items/recycle", post(routes::items::recycle::<S>))
        .route("/items/advance", post(routes::items::advance::<S>))
        .route("/items/{id}", get(routes::items::get::<S>))
        .route("/items/{id}/history", get(routes::items::history::<S>))
        .route("/events", get(routes::events::list::<S>))
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

/// Creates the application state over a fresh ledger with every read model
/// registered on one processor.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
    config: LedgerConfig,
) -> Arc<AppState<S>> {
    build_state(LedgerService::new(event_store.clone(), config), event_store)
}

/// Creates the application state over a ledger already restored from
/// `event_store`.
pub fn build_state<S: EventStore + Clone + 'static>(
    ledger: LedgerService<S>,
    event_store: S,
) -> Arc<AppState<S>> {
    let product_items = Arc::new(ProductItemsView::new());
    let manufacturer_products = Arc::new(ManufacturerProductsView::new());
    let status_history = Arc::new(StatusHistoryView::new());

    let mut processor = ProjectionProcessor::new(event_store);
    processor.register(Box::new(product_items.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(manufacturer_products.as_ref().clone()));
    processor.register(Box::new(status_history.as_ref().clone()));

    Arc::new(AppState {
        ledger,
        product_items,
        manufacturer_products,
        status_history,
        projection_processor: Arc::new(processor),
    })
}
