//! Read models and projections for the recycle ledger query side.
//!
//! This crate provides the query side of the ledger:
//! - [`Projection`] trait for processing events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding events from the store to projections
//! - Three read model views: items by product, products by manufacturer,
//!   and per-item status history

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition, decode_ledger_event};
pub use read_model::ReadModel;
pub use views::{
    ManufacturerProductsView, ManufacturerSummary, ProductItemsSummary, ProductItemsView,
    ProductSummary, StatusChange, StatusCounts, StatusHistoryView,
};
