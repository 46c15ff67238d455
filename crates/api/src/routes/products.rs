//! Product creation and item minting endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::ProductId;
use domain::{AddProductItems, CreateProduct, Product, ProductItem};
use event_store::EventStore;
use projections::StatusCounts;
use serde::{Deserialize, Serialize};

use super::{AppState, actor};
use crate::error::ApiError;

// -- Request types --

/// Toxic materials come as parallel name and weight arrays.
#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub toxic_names: Vec<String>,
    #[serde(default)]
    pub toxic_weights: Vec<u64>,
}

#[derive(Deserialize)]
pub struct AddItemsRequest {
    pub count: u64,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductCreatedResponse {
    pub product_id: u64,
}

#[derive(Serialize)]
pub struct ToxicMaterialResponse {
    pub name: String,
    pub weight: u64,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: u64,
    pub name: String,
    pub manufacturer: String,
    pub quantity: u64,
    pub toxic_materials: Vec<ToxicMaterialResponse>,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.as_u64(),
            name: p.name,
            manufacturer: p.manufacturer.to_string(),
            quantity: p.quantity,
            toxic_materials: p
                .toxic_materials
                .into_iter()
                .map(|m| ToxicMaterialResponse {
                    name: m.name,
                    weight: m.weight,
                })
                .collect(),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ItemsAddedResponse {
    pub item_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub product_id: u64,
    pub status: String,
}

impl From<ProductItem> for ItemResponse {
    fn from(item: ProductItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id().as_u64(),
            status: item.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ProductItemsSummaryResponse {
    pub product_id: u64,
    pub name: String,
    pub manufacturer: String,
    pub total: u64,
    pub counts: StatusCountsResponse,
}

#[derive(Serialize)]
pub struct StatusCountsResponse {
    pub manufactured: u64,
    pub sold: u64,
    pub returned: u64,
    pub recycled: u64,
}

impl From<StatusCounts> for StatusCountsResponse {
    fn from(c: StatusCounts) -> Self {
        Self {
            manufactured: c.manufactured,
            sold: c.sold,
            returned: c.returned,
            recycled: c.recycled,
        }
    }
}

// -- Handlers --

/// POST /products: create a product owned by the calling manufacturer.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductCreatedResponse>), ApiError> {
    let identity = actor(&headers)?;

    let product_id = state
        .ledger
        .create_product(CreateProduct::new(
            identity,
            req.name,
            req.toxic_names,
            req.toxic_weights,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse {
            product_id: product_id.as_u64(),
        }),
    ))
}

/// GET /products/{id}: load a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.ledger.get_product(ProductId::new(id)).await?;
    Ok(Json(product.into()))
}

/// POST /products/{id}/items: mint new units of a product.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add_items<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<AddItemsRequest>,
) -> Result<(StatusCode, Json<ItemsAddedResponse>), ApiError> {
    let identity = actor(&headers)?;

    let item_ids = state
        .ledger
        .add_product_items(AddProductItems::new(id, identity, req.count))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemsAddedResponse {
            item_ids: item_ids.iter().map(ToString::to_string).collect(),
        }),
    ))
}

/// GET /products/{id}/items: list the units of a product.
#[tracing::instrument(skip(state))]
pub async fn list_items<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.ledger.list_product_items(ProductId::new(id)).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /products/{id}/summary: per-status item counts from the read model.
#[tracing::instrument(skip(state))]
pub async fn summary<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u64>,
) -> Result<Json<ProductItemsSummaryResponse>, ApiError> {
    state.catch_up().await?;

    let summary = state
        .product_items
        .get_product(ProductId::new(id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    Ok(Json(ProductItemsSummaryResponse {
        product_id: summary.product_id.as_u64(),
        name: summary.name,
        manufacturer: summary.manufacturer.to_string(),
        total: summary.counts.total(),
        counts: summary.counts.into(),
    }))
}
