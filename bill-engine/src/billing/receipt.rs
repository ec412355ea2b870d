//! Receipt / KOT data assembly
//!
//! Builds the print contracts of [`shared::models::receipt`] from a bill or
//! from the cart. Rendering to printer bytes happens in
//! [`crate::printing::renderer`].

use super::cart::Cart;
use super::id_gen::order_no_for_bill;
use crate::utils::{money, time};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::models::{Bill, DiningTable, KotData, LineItem, ReceiptData, ReceiptItem};

/// Every bill is printed as its first KOT
const KOT_NO: &str = "1";
const NO_TABLE: &str = "N/A";
const TAKEAWAY_TABLE: &str = "T/A";

fn receipt_item(line: &LineItem) -> ReceiptItem {
    ReceiptItem {
        name: line.name.clone(),
        price: line.price,
        quantity: line.quantity,
    }
}

/// Customer bill for a persisted bill
pub fn receipt_from_bill(
    bill: &Bill,
    table: Option<&DiningTable>,
    user: &str,
    printed_at: DateTime<Utc>,
    tz: Tz,
) -> ReceiptData {
    let table = table
        .map(|t| t.short_code.clone())
        .or_else(|| bill.table_name.clone())
        .unwrap_or_else(|| NO_TABLE.to_string());

    ReceiptData {
        bill_no: bill.bill_id.clone(),
        order_no: order_no_for_bill(&bill.bill_id),
        kot_no: KOT_NO.to_string(),
        date: time::receipt_date(printed_at, tz),
        time: time::receipt_time(printed_at, tz),
        kind: bill.fulfillment.label().to_string(),
        table,
        user: user.to_string(),
        items: bill.items.iter().map(receipt_item).collect(),
        subtotal: bill.subtotal,
        discount_amount: bill.discount,
        total_amount: bill.total,
        total_qty: bill.total_quantity(),
        payment_method: bill.payment_method,
        split_payment: bill.split_payment.clone(),
        amount_received: bill.amount_received,
        change: bill.change,
    }
}

/// Customer bill from the cart; `None` until the bill has a display id
pub fn receipt_from_cart(
    cart: &Cart,
    user: &str,
    printed_at: DateTime<Utc>,
    tz: Tz,
) -> Option<ReceiptData> {
    let bill_no = cart.display_id()?;
    let subtotal = money::subtotal(cart.items());

    Some(ReceiptData {
        bill_no: bill_no.to_string(),
        order_no: order_no_for_bill(bill_no),
        kot_no: KOT_NO.to_string(),
        date: time::receipt_date(printed_at, tz),
        time: time::receipt_time(printed_at, tz),
        kind: cart.fulfillment().label().to_string(),
        table: cart
            .table()
            .map(|t| t.short_code.clone())
            .unwrap_or_else(|| NO_TABLE.to_string()),
        user: user.to_string(),
        items: cart.items().iter().map(receipt_item).collect(),
        subtotal: money::to_f64(subtotal),
        discount_amount: cart.discount(),
        total_amount: money::to_f64(money::total(subtotal, cart.discount())),
        total_qty: cart.total_quantity(),
        payment_method: None,
        split_payment: None,
        amount_received: None,
        change: None,
    })
}

/// Kitchen ticket for the quantities not yet sent; `None` if nothing is
/// pending
pub fn kot_from_cart(cart: &Cart, printed_at: DateTime<Utc>, tz: Tz) -> Option<KotData> {
    let items: Vec<ReceiptItem> = cart
        .pending_items()
        .into_iter()
        .map(|line| ReceiptItem {
            name: line.name.clone(),
            price: line.price,
            quantity: line.pending_kot_qty.unsigned_abs(),
        })
        .collect();
    if items.is_empty() {
        return None;
    }

    Some(KotData {
        table: cart
            .table()
            .map(|t| t.short_code.clone())
            .unwrap_or_else(|| TAKEAWAY_TABLE.to_string()),
        kind: cart.fulfillment().label().to_string(),
        total_qty: items.iter().map(|i| i.quantity).sum(),
        items,
        date: time::receipt_date(printed_at, tz),
        time: time::receipt_time(printed_at, tz),
    })
}
