//! Integration tests for the recycle ledger.
//!
//! These tests drive the ledger service end to end over the in-memory event
//! store, covering the item lifecycle, batch atomicity, persistence and
//! concurrency handling.

use std::sync::Arc;

use common::{ManufacturerId, ProductId};
use domain::{
    AddProductItems, AdvanceProductItems, Aggregate, CreateProduct, DomainError, Ledger,
    LedgerConfig, LedgerError, LedgerEvent, LedgerService, ProductStatus, RegisterManufacturer,
    TransitionPolicy,
};
use event_store::{EventStore, InMemoryEventStore, Sequence};

/// Helper to create a test ledger service
fn create_service() -> LedgerService<InMemoryEventStore> {
    LedgerService::new(InMemoryEventStore::new(), LedgerConfig::default())
}

async fn register(service: &LedgerService<InMemoryEventStore>, identity: &str) {
    service
        .register(RegisterManufacturer::new(identity, "Acme", "Berlin", "ops@acme.test"))
        .await
        .unwrap();
}

/// M1 owns product 1 with `count` items; M2 is registered too.
async fn seeded_service(count: u64) -> LedgerService<InMemoryEventStore> {
    let service = create_service();
    register(&service, "M1").await;
    register(&service, "M2").await;
    service
        .create_product(CreateProduct::with_materials("M1", "P", [("Lead", 5)]))
        .await
        .unwrap();
    service
        .add_product_items(AddProductItems::new(ProductId::new(1), "M1", count))
        .await
        .unwrap();
    service
}

async fn status_of(service: &LedgerService<InMemoryEventStore>, item_id: &str) -> ProductStatus {
    service.get_product_item(item_id).await.unwrap().status
}

fn ledger_error(result: Result<impl std::fmt::Debug, DomainError>) -> LedgerError {
    match result {
        Err(DomainError::Ledger(e)) => e,
        other => panic!("expected ledger rejection, got {other:?}"),
    }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn second_registration_is_rejected_and_keeps_original() {
        let service = create_service();
        register(&service, "M1").await;

        let result = service
            .register(RegisterManufacturer::new("M1", "Other", "Paris", "other@x"))
            .await;

        assert!(matches!(
            ledger_error(result),
            LedgerError::AlreadyRegistered { .. }
        ));
        let manufacturer = service
            .get_manufacturer(&ManufacturerId::new("M1"))
            .await
            .unwrap();
        assert_eq!(manufacturer.name, "Acme");
        assert_eq!(manufacturer.location, "Berlin");
        assert_eq!(service.current_sequence().await, Sequence::first());
    }

    #[tokio::test]
    async fn unregistered_lookup_is_not_registered() {
        let service = create_service();
        let result = service.get_manufacturer(&ManufacturerId::new("ghost")).await;
        assert!(matches!(result, Err(LedgerError::NotRegistered { .. })));
    }

    #[tokio::test]
    async fn unregistered_identity_cannot_create_products() {
        let service = create_service();
        let result = service
            .create_product(CreateProduct::new("ghost", "P", vec![], vec![]))
            .await;
        assert!(matches!(
            ledger_error(result),
            LedgerError::NotRegistered { .. }
        ));
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn mismatched_manifest_never_creates_a_product() {
        let service = create_service();
        register(&service, "M1").await;

        let result = service
            .create_product(CreateProduct::new(
                "M1",
                "P",
                vec!["Lead".to_string(), "Mercury".to_string()],
                vec![5],
            ))
            .await;

        let error = ledger_error(result);
        assert!(matches!(error, LedgerError::LengthMismatch { .. }));
        assert_eq!(error.to_string(), "Toxic items array length mismatch");
        assert!(service.get_product(ProductId::new(1)).await.is_err());

        // The failed attempt does not consume an id
        let id = service
            .create_product(CreateProduct::with_materials("M1", "P", [("Lead", 5)]))
            .await
            .unwrap();
        assert_eq!(id, ProductId::new(1));
    }

    #[tokio::test]
    async fn manifest_is_recorded_in_order() {
        let service = create_service();
        register(&service, "M1").await;

        let id = service
            .create_product(CreateProduct::with_materials(
                "M1",
                "Phone",
                [("Lead", 5), ("Cadmium", 2)],
            ))
            .await
            .unwrap();

        let product = service.get_product(id).await.unwrap();
        assert_eq!(product.manufacturer, ManufacturerId::new("M1"));
        assert_eq!(product.quantity, 0);
        let names: Vec<&str> = product
            .toxic_materials
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["Lead", "Cadmium"]);
    }

    #[tokio::test]
    async fn products_are_listed_per_owner() {
        let service = seeded_service(1).await;
        service
            .create_product(CreateProduct::new("M2", "Q", vec![], vec![]))
            .await
            .unwrap();
        service
            .create_product(CreateProduct::new("M1", "R", vec![], vec![]))
            .await
            .unwrap();

        let owned: Vec<ProductId> = service
            .list_products(&ManufacturerId::new("M1"))
            .await
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(owned, vec![ProductId::new(1), ProductId::new(3)]);
    }
}

mod items {
    use super::*;

    #[tokio::test]
    async fn ids_continue_across_calls() {
        let service = seeded_service(3).await;

        let ids = service
            .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 2))
            .await
            .unwrap();

        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["1-4", "1-5"]);
        assert_eq!(service.get_product(ProductId::new(1)).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn count_bounds() {
        let service = seeded_service(1).await;

        for count in [0, 11] {
            let result = service
                .add_product_items(AddProductItems::new(ProductId::new(1), "M1", count))
                .await;
            assert!(matches!(
                ledger_error(result),
                LedgerError::CountOutOfRange { .. }
            ));
        }
        assert_eq!(service.get_product(ProductId::new(1)).await.unwrap().quantity, 1);

        let ids = service
            .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 10))
            .await
            .unwrap();
        assert_eq!(ids.len(), 10);
        assert_eq!(service.get_product(ProductId::new(1)).await.unwrap().quantity, 11);
    }

    #[tokio::test]
    async fn non_owner_cannot_add() {
        let service = seeded_service(2).await;

        let result = service
            .add_product_items(AddProductItems::new(ProductId::new(1), "M2", 1))
            .await;

        let error = ledger_error(result);
        assert!(matches!(error, LedgerError::NotOwner { .. }));
        assert_eq!(
            error.to_string(),
            "Only the product manufacturer can add product items."
        );
        assert_eq!(service.get_product(ProductId::new(1)).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let service = seeded_service(1).await;
        let result = service
            .add_product_items(AddProductItems::new(ProductId::new(9), "M1", 1))
            .await;
        assert!(matches!(
            ledger_error(result),
            LedgerError::ProductNotFound { .. }
        ));
        assert!(service.list_product_items(ProductId::new(9)).await.is_err());
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn end_to_end_scenario() {
        let service = create_service();
        register(&service, "M1").await;

        let product_id = service
            .create_product(CreateProduct::with_materials("M1", "P", [("Lead", 5)]))
            .await
            .unwrap();
        assert_eq!(product_id, ProductId::new(1));

        let ids: Vec<String> = service
            .add_product_items(AddProductItems::new(product_id, "M1", 2))
            .await
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["1-1", "1-2"]);
        assert_eq!(service.get_product(product_id).await.unwrap().quantity, 2);

        service.sell_product_items("M1", ["1-1"]).await.unwrap();

        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Sold);
        assert_eq!(status_of(&service, "1-2").await, ProductStatus::Manufactured);
    }

    #[tokio::test]
    async fn sell_succeeds_exactly_once() {
        let service = seeded_service(1).await;

        service.sell_product_items("M1", ["1-1"]).await.unwrap();
        let result = service.sell_product_items("M1", ["1-1"]).await;

        let error = ledger_error(result);
        assert!(matches!(error, LedgerError::InvalidTransition { .. }));
        assert_eq!(error.to_string(), "Product Item cannot be sold.");
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Sold);
    }

    #[tokio::test]
    async fn full_chain_in_order() {
        let service = seeded_service(1).await;

        service.sell_product_items("M1", ["1-1"]).await.unwrap();
        service.return_product_items("M1", ["1-1"]).await.unwrap();
        service.recycle_product_items("M1", ["1-1"]).await.unwrap();

        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Recycled);

        // Recycled is terminal
        for result in [
            service.sell_product_items("M1", ["1-1"]).await,
            service.return_product_items("M1", ["1-1"]).await,
            service.recycle_product_items("M1", ["1-1"]).await,
        ] {
            assert!(matches!(
                ledger_error(result),
                LedgerError::InvalidTransition { .. }
            ));
        }
    }

    #[tokio::test]
    async fn skipping_a_step_fails() {
        let service = seeded_service(1).await;

        let returned = service.return_product_items("M1", ["1-1"]).await;
        assert!(matches!(
            ledger_error(returned),
            LedgerError::InvalidTransition {
                current: ProductStatus::Manufactured,
                ..
            }
        ));

        let recycled = service.recycle_product_items("M1", ["1-1"]).await;
        assert!(matches!(
            ledger_error(recycled),
            LedgerError::InvalidTransition { .. }
        ));
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Manufactured);
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let service = seeded_service(3).await;
        service.sell_product_items("M1", ["1-2"]).await.unwrap();
        let before = service.current_sequence().await;

        let result = service
            .sell_product_items("M1", ["1-1", "1-2", "1-3"])
            .await;

        assert!(matches!(
            ledger_error(result),
            LedgerError::InvalidTransition { .. }
        ));
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Manufactured);
        assert_eq!(status_of(&service, "1-3").await, ProductStatus::Manufactured);
        assert_eq!(service.current_sequence().await, before);
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_fail_the_batch() {
        let service = seeded_service(1).await;

        for bad in ["1-9", "9-1", "garbage", "", "+1-1", "01-1", "1-+1", "1-01"] {
            let result = service.sell_product_items("M1", ["1-1", bad]).await;
            assert!(
                matches!(ledger_error(result), LedgerError::ItemNotFound { .. }),
                "{bad:?}"
            );
        }
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Manufactured);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let service = seeded_service(1).await;
        let result = service.sell_product_items("M1", Vec::<String>::new()).await;

        let error = ledger_error(result);
        assert!(matches!(error, LedgerError::EmptyBatch { .. }));
        assert_eq!(error.to_string(), "No product items to be sold.");
    }

    #[tokio::test]
    async fn duplicate_id_in_batch_is_rejected() {
        let service = seeded_service(1).await;
        let result = service.sell_product_items("M1", ["1-1", "1-1"]).await;

        assert!(matches!(
            ledger_error(result),
            LedgerError::InvalidTransition { .. }
        ));
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Manufactured);
    }

    #[tokio::test]
    async fn advance_moves_one_step() {
        let service = seeded_service(2).await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let status = service
                .advance_product_items(AdvanceProductItems::new("M1", ["1-1", "1-2"]))
                .await
                .unwrap();
            statuses.push(status);
        }
        assert_eq!(
            statuses,
            vec![
                ProductStatus::Sold,
                ProductStatus::Returned,
                ProductStatus::Recycled
            ]
        );

        let result = service
            .advance_product_items(AdvanceProductItems::new("M1", ["1-1"]))
            .await;
        assert!(matches!(
            ledger_error(result),
            LedgerError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn advance_rejects_mixed_batch() {
        let service = seeded_service(2).await;
        service.sell_product_items("M1", ["1-2"]).await.unwrap();

        let result = service
            .advance_product_items(AdvanceProductItems::new("M1", ["1-1", "1-2"]))
            .await;

        assert!(matches!(
            ledger_error(result),
            LedgerError::InvalidTransition { .. }
        ));
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Manufactured);
    }

    #[tokio::test]
    async fn open_policy_lets_anyone_transition() {
        let service = seeded_service(1).await;
        service.sell_product_items("stranger", ["1-1"]).await.unwrap();
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Sold);
    }

    #[tokio::test]
    async fn owner_only_policy_restricts_transitions() {
        let config = LedgerConfig::default().with_transition_policy(TransitionPolicy::OwnerOnly);
        let service = LedgerService::new(InMemoryEventStore::new(), config);
        register(&service, "M1").await;
        service
            .create_product(CreateProduct::new("M1", "P", vec![], vec![]))
            .await
            .unwrap();
        service
            .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 1))
            .await
            .unwrap();

        let result = service.sell_product_items("M2", ["1-1"]).await;
        let error = ledger_error(result);
        assert!(matches!(error, LedgerError::NotOwner { .. }));
        assert_eq!(
            error.to_string(),
            "Only the product manufacturer can sell product items."
        );

        service.sell_product_items("M1", ["1-1"]).await.unwrap();
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Sold);
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn every_accepted_operation_appends_one_event() {
        let service = seeded_service(2).await;
        service.sell_product_items("M1", ["1-1", "1-2"]).await.unwrap();

        let events = service
            .events_since(Sequence::initial(), None)
            .await
            .unwrap();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                LedgerEvent::MANUFACTURER_REGISTERED,
                LedgerEvent::MANUFACTURER_REGISTERED,
                LedgerEvent::PRODUCT_CREATED,
                LedgerEvent::PRODUCT_ITEMS_ADDED,
                LedgerEvent::PRODUCT_ITEMS_STATUS_CHANGED,
            ]
        );
        let sequences: Vec<i64> = events.iter().map(|e| e.sequence.as_i64()).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn rejected_operation_appends_nothing() {
        let service = seeded_service(1).await;
        let store = service.handler().store().clone();
        let before = store.current_sequence().await.unwrap();

        let _ = service.return_product_items("M1", ["1-1"]).await;

        assert_eq!(store.current_sequence().await.unwrap(), before);
    }

    #[tokio::test]
    async fn reopen_rebuilds_state() {
        let store = InMemoryEventStore::new();
        let config = LedgerConfig::default().with_snapshot_interval(0);
        {
            let service = LedgerService::new(store.clone(), config.clone());
            register(&service, "M1").await;
            service
                .create_product(CreateProduct::with_materials("M1", "P", [("Lead", 5)]))
                .await
                .unwrap();
            service
                .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 3))
                .await
                .unwrap();
            service.sell_product_items("M1", ["1-2"]).await.unwrap();
        }

        let reopened = LedgerService::open(store, config).await.unwrap();

        assert_eq!(reopened.current_sequence().await, Sequence::new(4));
        assert!(reopened.is_registered(&ManufacturerId::new("M1")).await);
        assert_eq!(status_of(&reopened, "1-2").await, ProductStatus::Sold);
        let next = reopened
            .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 1))
            .await
            .unwrap();
        assert_eq!(next[0].to_string(), "1-4");
    }

    #[tokio::test]
    async fn reopen_from_snapshot() {
        let store = InMemoryEventStore::new();
        let config = LedgerConfig::default().with_snapshot_interval(2);
        {
            let service = LedgerService::new(store.clone(), config.clone());
            register(&service, "M1").await;
            service
                .create_product(CreateProduct::new("M1", "P", vec![], vec![]))
                .await
                .unwrap();
            service
                .add_product_items(AddProductItems::new(ProductId::new(1), "M1", 2))
                .await
                .unwrap();
        }

        let snapshot = store
            .get_snapshot(Ledger::aggregate_type())
            .await
            .unwrap()
            .expect("snapshot at sequence 2");
        assert_eq!(snapshot.sequence, Sequence::new(2));

        let reopened = LedgerService::open(store, config).await.unwrap();
        assert_eq!(reopened.current_sequence().await, Sequence::new(3));
        let items = reopened.list_product_items(ProductId::new(1)).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn second_writer_catches_up_before_deciding() {
        let store = InMemoryEventStore::new();
        let first = LedgerService::new(store.clone(), LedgerConfig::default());
        let second = LedgerService::new(store.clone(), LedgerConfig::default());

        register(&first, "M1").await;

        let result = second
            .register(RegisterManufacturer::new("M1", "Other", "", ""))
            .await;
        assert!(matches!(
            ledger_error(result),
            LedgerError::AlreadyRegistered { .. }
        ));
        assert!(second.is_registered(&ManufacturerId::new("M1")).await);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_sells_of_one_item_succeed_once() {
        let service = Arc::new(seeded_service(1).await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.sell_product_items("M1", ["1-1"]).await })
            })
            .collect();

        let mut accepted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DomainError::Ledger(LedgerError::InvalidTransition { .. })) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(rejected, 7);
        assert_eq!(status_of(&service, "1-1").await, ProductStatus::Sold);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let service = Arc::new(create_service());
        register(&service, "M1").await;

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .create_product(CreateProduct::new("M1", format!("P{i}"), vec![], vec![]))
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().as_u64());
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }
}

mod subscription {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_committed_events_in_order() {
        let service = seeded_service(2).await;
        let mut receiver = service.subscribe();

        service.sell_product_items("M1", ["1-1"]).await.unwrap();
        let _ = service.return_product_items("M1", ["1-2"]).await;
        service.return_product_items("M1", ["1-1"]).await.unwrap();

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.event_type, LedgerEvent::PRODUCT_ITEMS_STATUS_CHANGED);
        assert_eq!(first.sequence, Sequence::new(5));

        let second = receiver.recv().await.unwrap();
        assert_eq!(second.sequence, Sequence::new(6));
        let event: LedgerEvent = serde_json::from_value(second.payload).unwrap();
        assert_eq!(event.new_status(), Some(ProductStatus::Returned));

        // The rejected return was never published
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_since_filters_by_kind() {
        let service = seeded_service(2).await;
        service.sell_product_items("M1", ["1-1"]).await.unwrap();

        let added = service
            .events_since(Sequence::initial(), Some(LedgerEvent::PRODUCT_ITEMS_ADDED))
            .await
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].sequence, Sequence::new(4));

        let after = service
            .events_since(Sequence::new(4), None)
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].event_type, LedgerEvent::PRODUCT_ITEMS_STATUS_CHANGED);
    }
}
