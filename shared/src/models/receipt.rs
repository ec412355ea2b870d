//! Receipt / KOT print contracts
//!
//! Plain data handed to the renderers. Everything is pre-formatted text or
//! numbers; renderers do no lookups.

use super::{PaymentMethod, SplitPayment};
use serde::{Deserialize, Serialize};

/// Printed item row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Customer bill receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub bill_no: String,
    pub order_no: String,
    pub kot_no: String,
    /// e.g. "05 Mar 2025"
    pub date: String,
    /// e.g. "07:45 pm"
    pub time: String,
    /// Fulfillment label ("Dine In", "Take Away", ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    pub user: String,
    pub items: Vec<ReceiptItem>,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub total_qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_payment: Option<SplitPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
}

/// Kitchen order ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KotData {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<ReceiptItem>,
    pub total_qty: u32,
    pub date: String,
    pub time: String,
}
