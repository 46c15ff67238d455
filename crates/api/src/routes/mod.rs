//! HTTP route handlers and the state they share.

pub mod events;
pub mod health;
pub mod items;
pub mod manufacturers;
pub mod metrics;
pub mod products;

use std::sync::Arc;

use axum::http::HeaderMap;
use common::ManufacturerId;
use domain::LedgerService;
use event_store::EventStore;
use projections::{ManufacturerProductsView, ProductItemsView, ProjectionProcessor, StatusHistoryView};

use crate::error::ApiError;

/// Header carrying the caller's identity token.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub ledger: LedgerService<S>,
    pub product_items: Arc<ProductItemsView>,
    pub manufacturer_products: Arc<ManufacturerProductsView>,
    pub status_history: Arc<StatusHistoryView>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

impl<S: EventStore> AppState<S> {
    /// Brings the read models up to date with the log.
    pub async fn catch_up(&self) -> Result<(), ApiError> {
        self.projection_processor.run_catch_up().await?;
        Ok(())
    }
}

/// Reads the acting identity from the request headers.
///
/// The token is opaque and taken as given.
pub fn actor(headers: &HeaderMap) -> Result<ManufacturerId, ApiError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ManufacturerId::new)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static(" M1 "));
        assert_eq!(actor(&headers).unwrap(), ManufacturerId::new("M1"));
    }

    #[test]
    fn test_missing_or_blank_actor_is_rejected() {
        assert!(matches!(
            actor(&HeaderMap::new()),
            Err(ApiError::Unauthorized(_))
        ));

        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(actor(&headers), Err(ApiError::Unauthorized(_))));
    }
}
