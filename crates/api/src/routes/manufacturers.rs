//! Manufacturer registration and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::ManufacturerId;
use domain::{LedgerError, Manufacturer, RegisterManufacturer};
use event_store::EventStore;
use projections::ProductSummary;
use serde::{Deserialize, Serialize};

use super::{AppState, actor};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub location: String,
    pub contact: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct RegisteredResponse {
    pub identity: String,
    pub sequence: i64,
}

#[derive(Serialize)]
pub struct ManufacturerResponse {
    pub identity: String,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub registered_at: String,
}

impl From<Manufacturer> for ManufacturerResponse {
    fn from(m: Manufacturer) -> Self {
        Self {
            identity: m.identity.to_string(),
            name: m.name,
            location: m.location,
            contact: m.contact,
            registered_at: m.registered_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ProductSummaryResponse {
    pub product_id: u64,
    pub name: String,
    pub quantity: u64,
    pub recycled: u64,
    pub recycled_toxic_weight: u64,
}

impl From<ProductSummary> for ProductSummaryResponse {
    fn from(p: ProductSummary) -> Self {
        Self {
            product_id: p.product_id.as_u64(),
            recycled_toxic_weight: p.recycled_toxic_weight(),
            name: p.name,
            quantity: p.quantity,
            recycled: p.recycled,
        }
    }
}

// -- Handlers --

/// POST /manufacturers: register the calling identity as a manufacturer.
#[tracing::instrument(skip(state, headers, req))]
pub async fn register<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let identity = actor(&headers)?;

    let sequence = state
        .ledger
        .register(RegisterManufacturer::new(
            identity.clone(),
            req.name,
            req.location,
            req.contact,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            identity: identity.to_string(),
            sequence: sequence.as_i64(),
        }),
    ))
}

/// GET /manufacturers/{id}: load a manufacturer profile.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ManufacturerResponse>, ApiError> {
    let identity = ManufacturerId::new(id);
    match state.ledger.get_manufacturer(&identity).await {
        Ok(manufacturer) => Ok(Json(manufacturer.into())),
        Err(LedgerError::NotRegistered { .. }) => Err(ApiError::NotFound(format!(
            "Manufacturer {identity} not registered"
        ))),
        Err(err) => Err(err.into()),
    }
}

/// GET /manufacturers/{id}/products: products of a manufacturer from the
/// read model.
#[tracing::instrument(skip(state))]
pub async fn products<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductSummaryResponse>>, ApiError> {
    state.catch_up().await?;

    let identity = ManufacturerId::new(id);
    if state
        .manufacturer_products
        .get_manufacturer(&identity)
        .await
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Manufacturer {identity} not registered"
        )));
    }

    let products = state.manufacturer_products.products_of(&identity).await;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
