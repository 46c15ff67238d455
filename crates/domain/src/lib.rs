//! Domain layer for the recycle ledger.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced state
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - The ledger aggregate with its product item lifecycle

pub mod aggregate;
pub mod command;
pub mod error;
pub mod ledger;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult, Metadata};
pub use error::DomainError;
pub use ledger::{
    AddProductItems, AdvanceProductItems, ChangeItemStatus, CreateProduct, IdentityRegistry,
    Ledger, LedgerConfig, LedgerError, LedgerEvent, LedgerService, MAX_ITEMS_PER_BATCH,
    Manufacturer, ManufacturerRegisteredData, Product, ProductCatalog, ProductCreatedData,
    ProductItem, ProductItemLedger, ProductItemsAddedData, ProductItemsStatusChangedData,
    ProductStatus, RegisterManufacturer, ToxicMaterial, Transition, TransitionPolicy,
    UnknownStatusCode, UnknownTransitionPolicy,
};
