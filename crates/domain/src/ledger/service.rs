//! Ledger service providing the operation surface of the recycle ledger.

use common::{ManufacturerId, ProductId, ProductItemId};
use event_store::{EventEnvelope, EventQuery, EventStore, Sequence};
use tokio::sync::broadcast;

use crate::command::{Command, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    AddProductItems, AdvanceProductItems, ChangeItemStatus, CreateProduct, Ledger, LedgerConfig,
    LedgerError, LedgerEvent, Manufacturer, Product, ProductItem, ProductStatus,
    RegisterManufacturer,
};

/// Service for operating the recycle ledger.
///
/// Wraps the command handler with one method per ledger operation. Every
/// mutating call is applied as one atomic step; queries read a consistent
/// view that is either fully before or fully after any mutation.
pub struct LedgerService<S: EventStore> {
    handler: CommandHandler<S, Ledger>,
    config: LedgerConfig,
}

impl<S: EventStore> LedgerService<S> {
    /// Creates a service over an empty log.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        let handler = CommandHandler::new(store).with_snapshot_interval(config.snapshot_interval);
        Self { handler, config }
    }

    /// Creates a service and rebuilds the ledger from what `store` holds.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self, DomainError> {
        let service = Self::new(store, config);
        service.handler.restore().await?;
        Ok(service)
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Ledger> {
        &self.handler
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Subscribes to events as they are committed, in log order.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.handler.subscribe()
    }

    /// Registers a manufacturer.
    #[tracing::instrument(skip(self), fields(identity = %cmd.identity))]
    pub async fn register(&self, cmd: RegisterManufacturer) -> Result<Sequence, DomainError> {
        let result = self
            .dispatch(&cmd, |ledger| {
                ledger.register(&cmd.identity, &cmd.name, &cmd.location, &cmd.contact)
            })
            .await?;
        Ok(result.new_sequence)
    }

    /// Creates a product and returns its id.
    #[tracing::instrument(skip(self), fields(identity = %cmd.identity))]
    pub async fn create_product(&self, cmd: CreateProduct) -> Result<ProductId, DomainError> {
        let mut assigned = ProductId::first();
        self.dispatch(&cmd, |ledger| {
            // Decided under the writer lock, so this is the id the event carries
            assigned = ledger.catalog().next_id();
            ledger.create_product(
                &cmd.identity,
                &cmd.name,
                &cmd.toxic_names,
                &cmd.toxic_weights,
            )
        })
        .await?;
        Ok(assigned)
    }

    /// Adds units to a product and returns their ids.
    #[tracing::instrument(skip(self), fields(product_id = %cmd.product_id, identity = %cmd.identity))]
    pub async fn add_product_items(
        &self,
        cmd: AddProductItems,
    ) -> Result<Vec<ProductItemId>, DomainError> {
        let result = self
            .dispatch(&cmd, |ledger| {
                ledger.add_product_items(cmd.product_id, &cmd.identity, cmd.count)
            })
            .await?;

        let ids: Vec<ProductItemId> = result
            .events
            .iter()
            .flat_map(|event| event.item_ids().iter().copied())
            .collect();
        metrics::counter!("ledger_product_items_added_total").increment(ids.len() as u64);
        Ok(ids)
    }

    /// Moves a batch of items through one lifecycle transition.
    #[tracing::instrument(skip(self), fields(actor = %cmd.actor, transition = %cmd.transition))]
    pub async fn change_status(&self, cmd: ChangeItemStatus) -> Result<Sequence, DomainError> {
        let policy = self.config.transition_policy;
        let result = self
            .dispatch(&cmd, |ledger| {
                ledger.change_status(&cmd.actor, &cmd.item_ids, cmd.transition, policy)
            })
            .await?;

        record_status_changes(&result);
        Ok(result.new_sequence)
    }

    /// Manufactured → Sold for every listed item.
    pub async fn sell_product_items<I, T>(
        &self,
        actor: impl Into<ManufacturerId>,
        item_ids: I,
    ) -> Result<Sequence, DomainError>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.change_status(ChangeItemStatus::sell(actor, item_ids))
            .await
    }

    /// Sold → Returned for every listed item.
    pub async fn return_product_items<I, T>(
        &self,
        actor: impl Into<ManufacturerId>,
        item_ids: I,
    ) -> Result<Sequence, DomainError>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.change_status(ChangeItemStatus::return_items(actor, item_ids))
            .await
    }

    /// Returned → Recycled for every listed item.
    pub async fn recycle_product_items<I, T>(
        &self,
        actor: impl Into<ManufacturerId>,
        item_ids: I,
    ) -> Result<Sequence, DomainError>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.change_status(ChangeItemStatus::recycle(actor, item_ids))
            .await
    }

    /// Moves a batch one step forward from its shared current status and
    /// returns the status it moved to.
    #[tracing::instrument(skip(self), fields(actor = %cmd.actor))]
    pub async fn advance_product_items(
        &self,
        cmd: AdvanceProductItems,
    ) -> Result<ProductStatus, DomainError> {
        let policy = self.config.transition_policy;
        let result = self
            .dispatch(&cmd, |ledger| {
                ledger.advance_product_items(&cmd.actor, &cmd.item_ids, policy)
            })
            .await?;

        record_status_changes(&result);
        let status = result.events.iter().find_map(LedgerEvent::new_status);
        Ok(status.unwrap_or_default())
    }

    /// Returns true if `identity` has registered.
    pub async fn is_registered(&self, identity: &ManufacturerId) -> bool {
        self.handler
            .read(|ledger| ledger.is_registered(identity))
            .await
    }

    /// Returns the manufacturer profile of `identity`.
    pub async fn get_manufacturer(
        &self,
        identity: &ManufacturerId,
    ) -> Result<Manufacturer, LedgerError> {
        self.handler
            .read(|ledger| ledger.manufacturer(identity).cloned())
            .await
    }

    /// Returns a product by id.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, LedgerError> {
        self.handler
            .read(|ledger| ledger.product(id).cloned())
            .await
    }

    /// Returns a product item by its `"{product}-{sequence}"` id.
    pub async fn get_product_item(&self, item_id: &str) -> Result<ProductItem, LedgerError> {
        self.handler
            .read(|ledger| ledger.product_item(item_id).cloned())
            .await
    }

    /// Returns the items of a product in sequence order.
    pub async fn list_product_items(&self, id: ProductId) -> Result<Vec<ProductItem>, LedgerError> {
        self.handler
            .read(|ledger| {
                ledger
                    .product_items(id)
                    .map(|items| items.into_iter().cloned().collect())
            })
            .await
    }

    /// Returns the products owned by `identity`, in id order.
    pub async fn list_products(&self, identity: &ManufacturerId) -> Vec<Product> {
        self.handler
            .read(|ledger| ledger.catalog().owned_by(identity).cloned().collect())
            .await
    }

    /// Returns the position of the last accepted operation.
    pub async fn current_sequence(&self) -> Sequence {
        self.handler.sequence().await
    }

    /// Reads the log after `since`, optionally restricted to one event kind.
    pub async fn events_since(
        &self,
        since: Sequence,
        kind: Option<&str>,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut query = EventQuery::since(since);
        if let Some(kind) = kind {
            query = query.event_type(kind);
        }
        Ok(self.handler.store().query_events(query).await?)
    }

    /// Runs a command through the handler with logging and metrics.
    async fn dispatch<C, F>(&self, cmd: &C, decide: F) -> Result<CommandResult<Ledger>, DomainError>
    where
        C: Command<Aggregate = Ledger>,
        F: FnOnce(&Ledger) -> Result<Vec<LedgerEvent>, LedgerError> + Send,
    {
        let command = cmd.name();
        metrics::counter!("ledger_commands_total", "command" => command).increment(1);

        match self
            .handler
            .execute_with_snapshot(cmd.metadata(), decide)
            .await
        {
            Ok(result) => {
                tracing::info!(command, sequence = %result.new_sequence, "command accepted");
                Ok(result)
            }
            Err(e) => {
                let reason = match &e {
                    DomainError::Ledger(rejection) => rejection.reason(),
                    _ if e.is_concurrency_conflict() => "concurrency_conflict",
                    _ => "internal",
                };
                metrics::counter!(
                    "ledger_commands_rejected_total",
                    "command" => command,
                    "reason" => reason
                )
                .increment(1);
                tracing::warn!(command, reason, error = %e, "command rejected");
                Err(e)
            }
        }
    }
}

fn record_status_changes(result: &CommandResult<Ledger>) {
    for event in &result.events {
        if let Some(status) = event.new_status() {
            metrics::counter!("ledger_status_changes_total", "status" => status.as_str())
                .increment(event.item_ids().len() as u64);
        }
    }
}
