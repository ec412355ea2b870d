//! Line Item Model
//!
//! A line of the cart / bill. Besides the editable `quantity` it tracks what
//! the kitchen has already been told about:
//!
//! - `original_quantity`: quantity at the last successful save
//! - `pending_kot_qty`: `quantity - original_quantity`, positive for items
//!   not yet sent, negative for reductions not yet reconciled
//! - `order_refs`: kitchen orders carrying this line's sent quantity

use super::MenuItem;
use serde::{Deserialize, Serialize};

/// Reference from a line item to a kitchen order carrying part of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    /// Human-readable order id (`#O-DDMMYYYY-N`)
    pub order_id: String,
    /// Store document id of the kitchen order
    pub order_doc_id: String,
    /// Quantity of this line carried by that order
    pub quantity: u32,
}

/// Bill / cart line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Menu item id
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub original_quantity: u32,
    #[serde(default)]
    pub pending_kot_qty: i32,
    #[serde(default)]
    pub order_refs: Vec<OrderRef>,
}

impl LineItem {
    /// New unsent line with quantity 1
    pub fn from_menu(item: &MenuItem) -> Self {
        Self {
            id: item.doc_id.clone(),
            name: item.name.clone(),
            price: item.price,
            item_type: item.item_type.clone(),
            quantity: 1,
            original_quantity: 0,
            pending_kot_qty: 1,
            order_refs: Vec::new(),
        }
    }

    /// Quantity already sent to the kitchen
    pub fn sent_quantity(&self) -> u32 {
        self.order_refs.iter().map(|r| r.quantity).sum()
    }

    /// Recompute `pending_kot_qty` from the current quantity
    pub fn recompute_pending(&mut self) {
        self.pending_kot_qty = self.quantity as i32 - self.original_quantity as i32;
    }

    /// Mark the current quantity as reconciled with the kitchen
    pub fn mark_saved(&mut self) {
        self.original_quantity = self.quantity;
        self.pending_kot_qty = 0;
    }
}
