//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Position of the last accepted ledger operation.
    pub sequence: i64,
}

/// GET /health: liveness probe with the ledger's log position.
pub async fn check<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sequence: state.ledger.current_sequence().await.as_i64(),
    })
}
