//! Event log query endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::LedgerEvent;
use event_store::{EventEnvelope, EventStore, Metadata, Sequence};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

/// Query string of `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Only events after this sequence are returned.
    #[serde(default)]
    pub since: i64,

    /// Restricts the result to one event kind.
    pub kind: Option<String>,
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub sequence: i64,
    pub timestamp: String,
    pub payload: serde_json::Value,
    pub metadata: Metadata,
}

impl From<EventEnvelope> for EventEnvelopeResponse {
    fn from(e: EventEnvelope) -> Self {
        Self {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            sequence: e.sequence.as_i64(),
            timestamp: e.timestamp.to_rfc3339(),
            payload: e.payload,
            metadata: e.metadata,
        }
    }
}

/// GET /events?since=&kind=: read the log in sequence order.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    if query.since < 0 {
        return Err(ApiError::BadRequest(format!(
            "since must be non-negative, got {}",
            query.since
        )));
    }
    if let Some(kind) = query.kind.as_deref()
        && !LedgerEvent::KINDS.contains(&kind)
    {
        return Err(ApiError::BadRequest(format!("Unknown event kind: {kind}")));
    }

    let events = state
        .ledger
        .events_since(Sequence::new(query.since), query.kind.as_deref())
        .await?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}
