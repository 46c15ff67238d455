//! Identifier types shared across the recycle ledger crates.

mod types;

pub use types::{ManufacturerId, ParseProductItemIdError, ProductId, ProductItemId};
