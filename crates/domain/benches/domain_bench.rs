use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AddProductItems, Aggregate, CreateProduct, Ledger, LedgerConfig, LedgerEvent, LedgerService,
    RegisterManufacturer,
};
use event_store::{InMemoryEventStore, Sequence, store::EventStore};

fn config() -> LedgerConfig {
    LedgerConfig::default().with_snapshot_interval(0)
}

async fn seeded_service() -> LedgerService<InMemoryEventStore> {
    let service = LedgerService::new(InMemoryEventStore::new(), config());
    service
        .register(RegisterManufacturer::new("M1", "Acme", "Berlin", "ops@acme.test"))
        .await
        .unwrap();
    service
        .create_product(CreateProduct::with_materials("M1", "Phone", [("Lead", 5)]))
        .await
        .unwrap();
    service
}

fn bench_register(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/register_manufacturer", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = LedgerService::new(InMemoryEventStore::new(), config());
                service
                    .register(RegisterManufacturer::new("M1", "Acme", "Berlin", "x"))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_add_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = rt.block_on(seeded_service());

    c.bench_function("domain/add_10_product_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .add_product_items(AddProductItems::new(first_product(), "M1", 10))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/full_lifecycle_10_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = seeded_service().await;
                let ids: Vec<String> = service
                    .add_product_items(AddProductItems::new(first_product(), "M1", 10))
                    .await
                    .unwrap()
                    .iter()
                    .map(ToString::to_string)
                    .collect();

                service.sell_product_items("M1", &ids).await.unwrap();
                service.return_product_items("M1", &ids).await.unwrap();
                service.recycle_product_items("M1", &ids).await.unwrap();
            });
        });
    });
}

fn bench_restore(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    // Pre-populate: register, create, then 98 batches of 10 items
    rt.block_on(async {
        let service = LedgerService::new(store.clone(), config());
        service
            .register(RegisterManufacturer::new("M1", "Acme", "Berlin", "x"))
            .await
            .unwrap();
        service
            .create_product(CreateProduct::new("M1", "Phone", vec![], vec![]))
            .await
            .unwrap();
        for _ in 0..98 {
            service
                .add_product_items(AddProductItems::new(first_product(), "M1", 10))
                .await
                .unwrap();
        }
    });

    c.bench_function("domain/restore_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                LedgerService::open(store.clone(), config()).await.unwrap();
            });
        });
    });

    c.bench_function("domain/replay_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let envelopes = store.get_events_from(Sequence::first()).await.unwrap();
                let mut ledger = Ledger::default();
                for envelope in envelopes {
                    let event: LedgerEvent = serde_json::from_value(envelope.payload).unwrap();
                    ledger.apply(event);
                }
            });
        });
    });
}

fn first_product() -> common::ProductId {
    common::ProductId::first()
}

criterion_group!(
    benches,
    bench_register,
    bench_add_items,
    bench_full_lifecycle,
    bench_restore,
);
criterion_main!(benches);
