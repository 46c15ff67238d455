//! Read model views for the query side.

pub mod manufacturer_products;
pub mod product_items;
pub mod status_history;

pub use manufacturer_products::{ManufacturerProductsView, ManufacturerSummary, ProductSummary};
pub use product_items::{ProductItemsSummary, ProductItemsView, StatusCounts};
pub use status_history::{StatusChange, StatusHistoryView};
