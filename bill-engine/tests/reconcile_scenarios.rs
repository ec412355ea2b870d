//! 对账场景测试
//!
//! End-to-end save / remove / settle flows against the in-memory store.

mod common;

use bill_engine::billing::{Cart, DecrementOutcome, Tender};
use bill_engine::error::{BillingError, ValidationError};
use bill_engine::store::{DocumentStore, MemoryStore, collections};
use common::{all_orders, engine_on, menu, table};
use shared::models::{
    BillStatus, FulfillmentType, KitchenOrderStatus, LineItem, PaymentMethod,
};
use std::sync::Arc;

fn assert_saved_state(items: &[LineItem]) {
    for line in items {
        assert_eq!(line.pending_kot_qty, 0, "{} has unsaved delta", line.id);
        assert_eq!(line.original_quantity, line.quantity);
        let carried: u32 = line.order_refs.iter().map(|r| r.quantity).sum();
        assert_eq!(carried, line.quantity, "{} refs do not add up", line.id);
    }
}

#[tokio::test]
async fn test_simple_dine_in_save() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t1"));
    cart.add_item(&menu("paneer", 100.0));
    cart.add_item(&menu("paneer", 100.0));

    let outcome = engine.save(&mut cart).await.unwrap();
    assert_eq!(outcome.display_id, "#B-05032025-1");
    assert_eq!(outcome.total, 200.0);
    assert_eq!(outcome.created_orders.len(), 1);
    assert_eq!(outcome.created_orders[0].body.total_quantity(), 2);
    assert_eq!(store.len(collections::BILLS), 1);
    assert_eq!(store.len(collections::ORDERS), 1);

    assert_eq!(cart.display_id(), Some("#B-05032025-1"));
    assert!(!cart.has_pending_changes());
    assert_saved_state(cart.items());
}

#[tokio::test]
async fn test_totals_follow_discount() {
    let engine = engine_on(Arc::new(MemoryStore::new()));
    let mut cart = Cart::for_table(table("t1"));
    cart.add_item(&menu("paneer", 100.0));
    cart.add_item(&menu("naan", 40.0));
    cart.set_discount(15.5).unwrap();

    let outcome = engine.save(&mut cart).await.unwrap();
    assert_eq!(outcome.subtotal, 140.0);
    assert_eq!(outcome.total, 124.5);

    let bill = engine
        .repository()
        .get_bill(&outcome.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.total, bill.subtotal - bill.discount);

    // Removal keeps the saved discount
    engine.remove_item(&mut cart, "naan").await.unwrap();
    let bill = engine
        .repository()
        .get_bill(&outcome.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.subtotal, 100.0);
    assert_eq!(bill.total, 84.5);
}

#[tokio::test]
async fn test_quantity_conserved_across_saves() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t2"));
    cart.add_item(&menu("chai", 20.0));
    cart.add_item(&menu("samosa", 15.0));
    engine.save(&mut cart).await.unwrap();

    cart.set_quantity("chai", 4).unwrap();
    engine.save(&mut cart).await.unwrap();
    assert_saved_state(cart.items());

    cart.set_quantity("chai", 2).unwrap();
    cart.increment("samosa").unwrap();
    engine.save(&mut cart).await.unwrap();
    assert_saved_state(cart.items());

    // Store agrees with the refs
    let pending: u32 = all_orders(store.as_ref())
        .await
        .iter()
        .filter(|o| o.status == KitchenOrderStatus::Pending)
        .map(|o| o.body.quantity_of("chai"))
        .sum();
    assert_eq!(pending, 2);
}

#[tokio::test]
async fn test_dine_in_additions_get_new_orders() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t3"));
    cart.add_item(&menu("naan", 40.0));
    let first = engine.save(&mut cart).await.unwrap();
    let first_order = first.created_orders[0].clone();

    cart.add_item(&menu("naan", 40.0));
    let second = engine.save(&mut cart).await.unwrap();
    assert_eq!(second.created_orders.len(), 1);
    assert_ne!(second.created_orders[0].doc_id, first_order.doc_id);
    assert_eq!(second.created_orders[0].order_id, "#O-05032025-2");

    let unchanged = engine
        .repository()
        .get_order(&first_order.doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.body.total_quantity(), 1);
    assert_eq!(unchanged.updated_at, first_order.updated_at);
    assert_eq!(cart.line("naan").unwrap().order_refs.len(), 2);
}

#[tokio::test]
async fn test_partial_reduction_shrinks_order() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t4"));
    cart.add_item(&menu("biryani", 180.0));
    cart.increment("biryani").unwrap();
    let first = engine.save(&mut cart).await.unwrap();
    let order_doc_id = first.created_orders[0].doc_id.clone();

    assert_eq!(
        cart.decrement("biryani").unwrap(),
        DecrementOutcome::Decremented { quantity: 1 }
    );
    let second = engine.save(&mut cart).await.unwrap();
    assert!(second.created_orders.is_empty());
    assert_eq!(second.total, 180.0);

    let order = engine
        .repository()
        .get_order(&order_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, KitchenOrderStatus::Pending);
    assert_eq!(order.body.total_quantity(), 1);
    assert_eq!(order.subtotal, 180.0);
    assert_eq!(store.len(collections::ORDERS), 1);
    assert_saved_state(cart.items());
}

#[tokio::test]
async fn test_full_removal_cancels_every_order() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t5"));
    cart.add_item(&menu("dosa", 90.0));
    engine.save(&mut cart).await.unwrap();
    cart.increment("dosa").unwrap();
    engine.save(&mut cart).await.unwrap();
    assert_eq!(cart.line("dosa").unwrap().order_refs.len(), 2);

    let removed = engine.remove_item(&mut cart, "dosa").await.unwrap();
    assert_eq!(removed.quantity, 2);
    assert!(cart.items().is_empty());

    let orders = all_orders(store.as_ref()).await;
    assert_eq!(orders.len(), 2);
    assert!(
        orders
            .iter()
            .all(|o| o.status == KitchenOrderStatus::Cancelled)
    );
}

#[tokio::test]
async fn test_settlement_is_not_repeatable() {
    let engine = engine_on(Arc::new(MemoryStore::new()));
    let mut cart = Cart::for_table(table("t6"));
    cart.add_item(&menu("thali", 250.0));
    let saved = engine.save(&mut cart).await.unwrap();

    let first = engine
        .settle_cart(&mut cart, Tender::single(PaymentMethod::Cash, 300.0))
        .await
        .unwrap();
    assert_eq!(first.change, 50.0);
    assert_eq!(cart.status(), BillStatus::Paid);

    let err = engine
        .settle(&saved.bill_doc_id, Tender::single(PaymentMethod::Card, 250.0))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::AlreadySettled(_)));

    let bill = engine
        .repository()
        .get_bill(&saved.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.paid_at, Some(first.paid_at));
    assert_eq!(bill.change, Some(50.0));
    assert_eq!(bill.payment_method, Some(PaymentMethod::Cash));
}

#[tokio::test]
async fn test_split_shortfall_leaves_bill_open() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::for_table(table("t7"));
    cart.add_item(&menu("paneer", 100.0));
    cart.add_item(&menu("paneer", 100.0));
    let saved = engine.save(&mut cart).await.unwrap();

    let err = engine
        .settle(
            &saved.bill_doc_id,
            Tender::split([(PaymentMethod::Cash, 50.0), (PaymentMethod::Upi, 100.0)]),
        )
        .await
        .unwrap_err();
    match err {
        BillingError::InsufficientPayment { required, tendered } => {
            assert_eq!(required, 200.0);
            assert_eq!(tendered, 150.0);
        }
        other => panic!("unexpected error: {other}"),
    }

    let bill = engine
        .repository()
        .get_bill(&saved.bill_doc_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.status, BillStatus::Open);
    assert!(bill.paid_at.is_none());
    assert!(
        all_orders(store.as_ref())
            .await
            .iter()
            .all(|o| o.status == KitchenOrderStatus::Pending)
    );
}

#[tokio::test]
async fn test_platform_order_needs_platform_id() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut cart = Cart::new(FulfillmentType::Swiggy);
    cart.add_item(&menu("burger", 150.0));

    let err = engine.save(&mut cart).await.unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::PlatformIdRequired)
    ));
    assert!(store.is_empty(collections::BILLS));
    assert!(store.is_empty(collections::ORDERS));

    cart.set_platform_order_id(Some(" SW-1234 ".to_string()));
    let outcome = engine.save(&mut cart).await.unwrap();
    assert_eq!(outcome.created_orders.len(), 1);
    assert_eq!(
        outcome.created_orders[0].platform_order_id.as_deref(),
        Some("SW-1234")
    );
}

#[tokio::test]
async fn test_saved_bill_keeps_its_table() {
    let engine = engine_on(Arc::new(MemoryStore::new()));
    let mut cart = Cart::for_table(table("t8"));
    cart.add_item(&menu("chai", 20.0));
    let first = engine.save(&mut cart).await.unwrap();

    assert_eq!(
        cart.set_table(Some(table("t9"))),
        Err(ValidationError::TableLocked)
    );
    cart.add_item(&menu("samosa", 15.0));
    let second = engine.save(&mut cart).await.unwrap();
    assert_eq!(second.created_orders.len(), 1);
    assert_eq!(second.created_orders[0].table_id.as_deref(), Some("t8"));

    let repo = engine.repository();
    let open = repo.open_bills_for_table("t8").await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].doc_id, first.bill_doc_id);
    assert!(repo.open_bills_for_table("t9").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_kitchen_feed_sees_saves() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_on(store.clone());
    let mut feed = engine
        .repository()
        .watch_orders(KitchenOrderStatus::Pending);
    assert!(feed.next().await.unwrap().unwrap().is_empty());

    let mut cart = Cart::new(FulfillmentType::TakeAway);
    cart.add_item(&menu("vada", 30.0));
    engine.save(&mut cart).await.unwrap();

    // create + bill back-fill each publish; the latest snapshot has the order
    let snapshot = feed.next().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.query(feed.query()).await.unwrap().len(), 1);
}
