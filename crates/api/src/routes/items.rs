//! Product item lookup and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use domain::{AdvanceProductItems, ChangeItemStatus, Transition};
use event_store::EventStore;
use projections::StatusChange;
use serde::{Deserialize, Serialize};

use super::products::ItemResponse;
use super::{AppState, actor};
use crate::error::ApiError;

// -- Request types --

/// Item ids in `"{product}-{sequence}"` form.
#[derive(Deserialize)]
pub struct ItemBatchRequest {
    pub item_ids: Vec<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct StatusChangedResponse {
    pub item_ids: Vec<String>,
    pub status: String,
    pub sequence: i64,
}

#[derive(Serialize)]
pub struct AdvancedResponse {
    pub item_ids: Vec<String>,
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusChangeResponse {
    pub status: String,
    pub sequence: i64,
    pub changed_at: String,
    pub actor: Option<String>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            status: change.status.to_string(),
            sequence: change.sequence.as_i64(),
            changed_at: change.changed_at.to_rfc3339(),
            actor: change.actor,
        }
    }
}

// -- Handlers --

/// GET /items/{id}: load a single product item.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state.ledger.get_product_item(&id).await?;
    Ok(Json(item.into()))
}

/// GET /items/{id}/history: every status an item has held, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StatusChangeResponse>>, ApiError> {
    let item = state.ledger.get_product_item(&id).await?;
    state.catch_up().await?;

    let history = state.status_history.history_of(item.id).await;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

/// POST /items/sell: Manufactured → Sold.
pub async fn sell<S: EventStore + Clone + 'static>(
    state: State<Arc<AppState<S>>>,
    headers: HeaderMap,
    req: Json<ItemBatchRequest>,
) -> Result<Json<StatusChangedResponse>, ApiError> {
    change_status(state, headers, req, Transition::Sell).await
}

/// POST /items/return: Sold → Returned.
pub async fn return_items<S: EventStore + Clone + 'static>(
    state: State<Arc<AppState<S>>>,
    headers: HeaderMap,
    req: Json<ItemBatchRequest>,
) -> Result<Json<StatusChangedResponse>, ApiError> {
    change_status(state, headers, req, Transition::Return).await
}

/// POST /items/recycle: Returned → Recycled.
pub async fn recycle<S: EventStore + Clone + 'static>(
    state: State<Arc<AppState<S>>>,
    headers: HeaderMap,
    req: Json<ItemBatchRequest>,
) -> Result<Json<StatusChangedResponse>, ApiError> {
    change_status(state, headers, req, Transition::Recycle).await
}

/// POST /items/advance: move every item one step from its shared status.
#[tracing::instrument(skip(state, headers, req))]
pub async fn advance<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<ItemBatchRequest>,
) -> Result<Json<AdvancedResponse>, ApiError> {
    let identity = actor(&headers)?;

    let status = state
        .ledger
        .advance_product_items(AdvanceProductItems::new(identity, &req.item_ids))
        .await?;

    Ok(Json(AdvancedResponse {
        item_ids: req.item_ids,
        status: status.to_string(),
    }))
}

#[tracing::instrument(skip(state, headers, req))]
async fn change_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<ItemBatchRequest>,
    transition: Transition,
) -> Result<Json<StatusChangedResponse>, ApiError> {
    let identity = actor(&headers)?;

    let sequence = state
        .ledger
        .change_status(ChangeItemStatus::new(identity, &req.item_ids, transition))
        .await?;

    Ok(Json(StatusChangedResponse {
        item_ids: req.item_ids,
        status: transition.target().to_string(),
        sequence: sequence.as_i64(),
    }))
}

