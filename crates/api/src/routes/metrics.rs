//! Prometheus metrics endpoint.
//!
//! Exposes the ledger command counters (`ledger_commands_total`,
//! `ledger_commands_rejected_total`, `ledger_product_items_added_total`,
//! `ledger_status_changes_total`), the event store counters and
//! `projections_events_processed`.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics: renders every recorded series in the text exposition format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], handle.render())
}
