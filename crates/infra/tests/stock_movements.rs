//! End-to-end stock movements through the service, including concurrent
//! issues against a single product.

use std::sync::Arc;
use std::thread;

use costledger_core::TenantId;
use costledger_events::{Event, EventBus, InMemoryEventBus};
use costledger_infra::{
    InMemoryProductRepository, MovementError, StockMovementService, ValuationConfig,
    ValuationEnvelope,
};
use costledger_inventory::{InventoryValuationEvent, ValuationError};
use costledger_products::{StockBatch, ValuationMethod};

type Service =
    StockMovementService<Arc<InMemoryProductRepository>, Arc<InMemoryEventBus<ValuationEnvelope>>>;

fn service() -> (Arc<Service>, Arc<InMemoryEventBus<ValuationEnvelope>>) {
    let bus = Arc::new(InMemoryEventBus::new());
    let svc = StockMovementService::new(
        Arc::new(InMemoryProductRepository::new()),
        bus.clone(),
        ValuationConfig::default(),
    );
    (Arc::new(svc), bus)
}

#[test]
fn concurrent_issues_never_overdraw() {
    let (svc, _bus) = service();
    let tenant = TenantId::new();
    let product = svc
        .register_product(tenant, "SKU-CONC", Some(ValuationMethod::Fifo))
        .unwrap();
    svc.receive(tenant, product.id, 100.0, 2.0).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || svc.issue(tenant, product.id, 10.0))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(MovementError::Valuation(ValuationError::InsufficientStock { .. }))
            )
        })
        .count();

    assert_eq!(succeeded, 10);
    assert_eq!(rejected, 6);

    let stored = svc.product(tenant, product.id).unwrap();
    assert_eq!(stored.stock_quantity, 0.0);
    assert!(stored.stock_queue.is_empty());
    assert_eq!(stored.stock_value, 0.0);
}

#[test]
fn sequence_numbers_are_gapless_per_product() {
    let (svc, bus) = service();
    let sub = bus.subscribe();
    let tenant = TenantId::new();
    let a = svc.register_product(tenant, "A", Some(ValuationMethod::Lifo)).unwrap();
    let b = svc.register_product(tenant, "B", None).unwrap();

    let workers: Vec<_> = [a.id, b.id]
        .into_iter()
        .map(|id| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                for i in 0..25 {
                    svc.receive(tenant, id, 1.0, 1.0 + i as f64).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let envelopes = sub.drain();
    assert_eq!(envelopes.len(), 50);
    for id in [a.id, b.id] {
        let mut seqs: Vec<u64> = envelopes
            .iter()
            .filter(|e| e.aggregate_id() == id.0)
            .map(|e| e.sequence_number())
            .collect();
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=25).collect::<Vec<u64>>());
    }
}

#[test]
fn lifo_lifecycle_with_conversion_and_repair() {
    let (svc, bus) = service();
    let sub = bus.subscribe();
    let tenant = TenantId::new();
    let p = svc.register_product(tenant, "SKU-L", Some(ValuationMethod::Lifo)).unwrap();

    svc.receive(tenant, p.id, 100.0, 10.0).unwrap();
    svc.receive(tenant, p.id, 50.0, 12.0).unwrap();
    let out = svc.issue(tenant, p.id, 120.0).unwrap();
    assert_eq!(out.cost_of_goods_sold, 1300.0);

    let stored = svc.product(tenant, p.id).unwrap();
    assert_eq!(stored.stock_queue.as_slice(), &[StockBatch::new(30.0, 10.0)]);

    let converted = svc.convert(tenant, p.id, ValuationMethod::WeightedAverage).unwrap();
    assert_eq!(converted.stock_value, 300.0);

    let inc = svc.receive(tenant, p.id, 30.0, 20.0).unwrap();
    assert_eq!(inc.new_rate, 15.0);

    let repaired = svc.repair(tenant, p.id).unwrap();
    assert_eq!(repaired.stock_queue.as_slice(), &[StockBatch::new(60.0, 15.0)]);

    let events: Vec<InventoryValuationEvent> =
        sub.drain().into_iter().map(|e| e.into_payload()).collect();
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "inventory.valuation.stock_received",
            "inventory.valuation.stock_received",
            "inventory.valuation.stock_issued",
            "inventory.valuation.method_converted",
            "inventory.valuation.stock_received",
            "inventory.valuation.queue_repaired",
        ]
    );

    let summary = svc.summary(tenant);
    assert_eq!(summary.total_value, 900.0);
    assert!(svc.reconcile(tenant).unwrap().is_clean());
}
