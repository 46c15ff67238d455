//! Read model trait for query-side views.

/// A read model providing query access to denormalized ledger data.
///
/// Read models are fed by projections and answer queries the ledger itself
/// does not index, such as items by status or products by manufacturer.
pub trait ReadModel: Send + Sync {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Returns the number of top-level entries in this read model.
    fn count(&self) -> usize;
}
