//! 写入失败与补偿测试
//!
//! Every failing write must leave the store as it was before the operation
//! and leave the cart untouched so the cashier can retry.

mod common;

use bill_engine::billing::Cart;
use bill_engine::error::BillingError;
use bill_engine::store::collections;
use common::{FlakyStore, all_orders, engine_on, menu, table};
use shared::models::{BillStatus, KitchenOrderStatus};
use std::sync::Arc;

#[tokio::test]
async fn test_bill_create_failure_cancels_new_orders() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t1"));
    cart.add_item(&menu("paneer", 100.0));
    cart.add_item(&menu("naan", 40.0));

    store.fail_creates_in(collections::BILLS);
    let err = engine.save(&mut cart).await.unwrap_err();
    let BillingError::Persistence(report) = err else {
        panic!("expected a persistence error, got {err}");
    };
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.compensated.len(), 2);
    assert!(report.fully_compensated());

    let orders = all_orders(store.as_ref()).await;
    assert_eq!(orders.len(), 2);
    assert!(
        orders
            .iter()
            .all(|o| o.status == KitchenOrderStatus::Cancelled)
    );
    assert_eq!(store.len(collections::BILLS), 0);

    // Cart still holds the unsaved deltas
    assert!(cart.bill_doc_id().is_none());
    assert!(cart.items().iter().all(|l| l.pending_kot_qty == 1));
    assert!(cart.items().iter().all(|l| l.order_refs.is_empty()));

    store.heal();
    let outcome = engine.save(&mut cart).await.unwrap();
    assert_eq!(outcome.display_id, "#B-05032025-1");
    assert_eq!(outcome.created_orders.len(), 2);
}

#[tokio::test]
async fn test_bill_update_failure_cancels_added_order() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t2"));
    cart.add_item(&menu("dal", 80.0));
    let first = engine.save(&mut cart).await.unwrap();

    cart.increment("dal").unwrap();
    store.fail_updates_of(&first.bill_doc_id);
    let err = engine.save(&mut cart).await.unwrap_err();
    assert!(matches!(err, BillingError::Persistence(ref r) if r.fully_compensated()));

    let orders = all_orders(store.as_ref()).await;
    let pending: Vec<_> = orders
        .iter()
        .filter(|o| o.status == KitchenOrderStatus::Pending)
        .collect();
    assert_eq!(orders.len(), 2);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].doc_id, first.created_orders[0].doc_id);

    let bill = engine
        .repository()
        .get_bill(&first.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.items[0].quantity, 1);
    assert_eq!(cart.line("dal").unwrap().pending_kot_qty, 1);

    store.heal();
    engine.save(&mut cart).await.unwrap();
    assert_eq!(cart.line("dal").unwrap().order_refs.len(), 2);
}

#[tokio::test]
async fn test_cancel_bill_failure_restores_orders() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t3"));
    cart.add_item(&menu("idli", 50.0));
    cart.add_item(&menu("vada", 30.0));
    let saved = engine.save(&mut cart).await.unwrap();

    store.fail_updates_of(&saved.bill_doc_id);
    let err = engine.cancel_bill(&mut cart).await.unwrap_err();
    let BillingError::Persistence(report) = err else {
        panic!("expected a persistence error, got {err}");
    };
    assert_eq!(report.compensated.len(), 2);
    assert!(report.fully_compensated());

    assert!(
        all_orders(store.as_ref())
            .await
            .iter()
            .all(|o| o.status == KitchenOrderStatus::Pending)
    );
    assert_eq!(cart.status(), BillStatus::Open);

    store.heal();
    engine.cancel_bill(&mut cart).await.unwrap();
    assert_eq!(cart.status(), BillStatus::Cancelled);
    assert!(
        all_orders(store.as_ref())
            .await
            .iter()
            .all(|o| o.status == KitchenOrderStatus::Cancelled)
    );
}

#[tokio::test]
async fn test_failed_removal_keeps_line() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t4"));
    cart.add_item(&menu("lassi", 60.0));
    let saved = engine.save(&mut cart).await.unwrap();

    store.fail_updates_of(&saved.created_orders[0].doc_id);
    let err = engine.remove_item(&mut cart, "lassi").await.unwrap_err();
    assert!(matches!(err, BillingError::Persistence(_)));
    assert_eq!(cart.items().len(), 1);

    let bill = engine
        .repository()
        .get_bill(&saved.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.items.len(), 1);
}
