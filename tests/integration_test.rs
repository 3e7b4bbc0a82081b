//! End-to-end flow over in-memory storage and scripted suppliers:
//! payment confirmation, supplier routing, delivery, retries, and
//! supplier switching.

use datashop::fulfillment::{FulfillmentOrchestrator, FulfillmentOutcome};
use datashop::routing::SupplierRouter;
use datashop::store::{MemoryStore, OrderStore, PackageStore};
use datashop::suppliers::{MockSupplier, PurchaseResult};
use datashop::types::{
    FulfillmentStatus, Order, Package, PaymentStatus, SupplierId, DEFAULT_PROCESSING_FEE_BPS,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

struct Harness {
    store: Arc<MemoryStore>,
    dataxpress: Arc<MockSupplier>,
    hubnet: Arc<MockSupplier>,
    router: Arc<SupplierRouter>,
    orchestrator: Arc<FulfillmentOrchestrator>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dataxpress = Arc::new(MockSupplier::new(SupplierId::DataXpress));
    let hubnet = Arc::new(MockSupplier::new(SupplierId::Hubnet));

    let router = Arc::new(
        SupplierRouter::new(store.clone(), SupplierId::DataXpress)
            .register(dataxpress.clone())
            .register(hubnet.clone()),
    );
    let orchestrator = Arc::new(FulfillmentOrchestrator::new(
        store.clone(),
        store.clone(),
        router.clone(),
    ));

    Harness {
        store,
        dataxpress,
        hubnet,
        router,
        orchestrator,
    }
}

fn ten_gig_package() -> Package {
    Package::new(
        "10GB".parse().unwrap(),
        Decimal::from_str("46.00").unwrap(),
        Decimal::from_str("32.20").unwrap(),
    )
}

async fn paid_order(h: &Harness, package: &Package) -> Order {
    let order = Order::new(package, "0241234567", "kofi@example.com", DEFAULT_PROCESSING_FEE_BPS);
    h.store.create_order(&order).await.unwrap();
    order
}

async fn wait_for_terminal(h: &Harness, order_id: &str) -> Order {
    for _ in 0..100 {
        let order = h.store.order(order_id).await.unwrap().unwrap();
        if order.fulfillment_status != FulfillmentStatus::Pending
            && order.fulfillment_status != FulfillmentStatus::Processing
        {
            return order;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("order {order_id} never reached a terminal fulfillment state");
}

#[tokio::test]
async fn payment_webhook_drives_order_to_fulfilled() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();
    let order = paid_order(&h, &package).await;

    // Order carries price plus the processing fee.
    assert_eq!(order.amount, Decimal::from_str("46.00").unwrap());
    assert_eq!(order.fee, Some(Decimal::from_str("0.54").unwrap()));
    assert_eq!(order.total_amount, Some(Decimal::from_str("46.54").unwrap()));

    h.dataxpress.set_purchase_result(PurchaseResult::ok(
        "Order placed successfully",
        Some(json!({ "transaction_id": "DX-555" })),
    ));

    h.orchestrator
        .handle_payment_success(&order.payment_reference)
        .await
        .unwrap();

    let done = wait_for_terminal(&h, &order.id).await;
    assert_eq!(done.status, PaymentStatus::Completed);
    assert_eq!(done.fulfillment_status, FulfillmentStatus::Fulfilled);
    assert_eq!(done.supplier_reference.as_deref(), Some("DX-555"));

    // The supplier saw the wholesale cost, not what the customer paid.
    let sent = &h.dataxpress.recorded_purchases()[0];
    assert_eq!(sent.price, Decimal::from_str("32.20").unwrap());
    assert_eq!(sent.order_reference, order.payment_reference);
    assert_eq!(h.hubnet.purchase_count(), 0);
}

#[tokio::test]
async fn supplier_switch_routes_later_orders_only() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();

    let first = paid_order(&h, &package).await;
    let outcome = h.orchestrator.fulfill(&first.id).await.unwrap();
    assert!(matches!(
        outcome,
        FulfillmentOutcome::Fulfilled {
            supplier: SupplierId::DataXpress,
            ..
        }
    ));

    h.router
        .set_active_supplier(SupplierId::Hubnet)
        .await
        .unwrap();

    let second = paid_order(&h, &package).await;
    let outcome = h.orchestrator.fulfill(&second.id).await.unwrap();
    assert!(matches!(
        outcome,
        FulfillmentOutcome::Fulfilled {
            supplier: SupplierId::Hubnet,
            ..
        }
    ));

    assert_eq!(h.dataxpress.purchase_count(), 1);
    assert_eq!(h.hubnet.purchase_count(), 1);
}

#[tokio::test]
async fn failed_order_retries_without_failover() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();
    let order = paid_order(&h, &package).await;

    h.dataxpress
        .set_purchase_result(PurchaseResult::err("insufficient balance"));

    let outcome = h.orchestrator.fulfill(&order.id).await.unwrap();
    assert_eq!(
        outcome,
        FulfillmentOutcome::Failed {
            supplier: SupplierId::DataXpress,
            message: "insufficient balance".to_string(),
        }
    );

    // Failure stays with the selected supplier.
    assert_eq!(h.hubnet.purchase_count(), 0);
    let stored = h.store.order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.fulfillment_status, FulfillmentStatus::Failed);
    assert_eq!(
        stored.fulfillment_error.as_deref(),
        Some("insufficient balance")
    );

    // Wallet topped up; an admin retry goes back to the same supplier.
    h.dataxpress.set_purchase_result(PurchaseResult::ok(
        "Order placed successfully",
        Some(json!({ "transaction_id": "DX-2" })),
    ));
    let outcome = h.orchestrator.retry(&order.id).await.unwrap();
    assert!(matches!(outcome, FulfillmentOutcome::Fulfilled { .. }));
    assert_eq!(h.dataxpress.purchase_count(), 2);

    let stored = h.store.order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.fulfillment_status, FulfillmentStatus::Fulfilled);
    assert_eq!(stored.fulfillment_error, None);
}

#[tokio::test]
async fn duplicate_webhooks_purchase_once() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();
    let order = paid_order(&h, &package).await;

    // The payment provider redelivers the same event.
    h.orchestrator
        .handle_payment_success(&order.payment_reference)
        .await
        .unwrap();
    h.orchestrator
        .handle_payment_success(&order.payment_reference)
        .await
        .unwrap();

    let done = wait_for_terminal(&h, &order.id).await;
    assert_eq!(done.fulfillment_status, FulfillmentStatus::Fulfilled);

    // Give the second background task time to lose the claim.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(h.dataxpress.purchase_count(), 1);
}

#[tokio::test]
async fn concurrent_fulfill_calls_purchase_once() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();
    let order = paid_order(&h, &package).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orchestrator = h.orchestrator.clone();
        let id = order.id.clone();
        handles.push(tokio::spawn(async move { orchestrator.fulfill(&id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(h.dataxpress.purchase_count(), 1);
    let stored = h.store.order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.fulfillment_status, FulfillmentStatus::Fulfilled);
}

#[tokio::test]
async fn fulfilled_orders_ignore_further_triggers() {
    let h = harness();
    let package = ten_gig_package();
    h.store.create_package(&package).await.unwrap();
    let order = paid_order(&h, &package).await;

    h.orchestrator.fulfill(&order.id).await.unwrap();
    let outcome = h.orchestrator.fulfill(&order.id).await.unwrap();
    assert_eq!(
        outcome,
        FulfillmentOutcome::AlreadyHandled {
            status: FulfillmentStatus::Fulfilled,
        }
    );
    assert_eq!(h.dataxpress.purchase_count(), 1);
}
