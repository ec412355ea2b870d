//! Kitchen Order Model (KOT)
//!
//! Kitchen orders are never deleted. They move `pending → completed` or
//! `pending → cancelled`, and a pending order may be rewritten in place when
//! the bill it belongs to is reduced.

use super::bill::FulfillmentType;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// 厨房单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KitchenOrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

/// Snapshot of a menu item as sent to the kitchen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub item_name: String,
    pub item_price: f64,
}

/// One entry of a batch order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub item: ItemSnapshot,
    pub quantity: u32,
}

/// Order body
///
/// Dine-in sends one order per line increment (`Single`); take-away and
/// platform bills send one order per save listing every increment (`Batch`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KitchenOrderBody {
    Single { item: ItemSnapshot, quantity: u32 },
    Batch { items: Vec<BatchEntry> },
}

impl KitchenOrderBody {
    /// Quantity of the given menu item carried by this body
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        match self {
            Self::Single { item, quantity } if item.item_id == item_id => *quantity,
            Self::Single { .. } => 0,
            Self::Batch { items } => items
                .iter()
                .filter(|e| e.item.item_id == item_id)
                .map(|e| e.quantity)
                .sum(),
        }
    }

    pub fn total_quantity(&self) -> u32 {
        match self {
            Self::Single { quantity, .. } => *quantity,
            Self::Batch { items } => items.iter().map(|e| e.quantity).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_quantity() == 0
    }

    /// Iterate `(item, quantity)` pairs regardless of shape
    pub fn entries(&self) -> Vec<(&ItemSnapshot, u32)> {
        match self {
            Self::Single { item, quantity } => vec![(item, *quantity)],
            Self::Batch { items } => items.iter().map(|e| (&e.item, e.quantity)).collect(),
        }
    }
}

/// Kitchen order ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenOrder {
    #[serde(default, skip_serializing)]
    pub doc_id: String,
    /// Human-readable id (`#O-DDMMYYYY-N`)
    pub order_id: String,
    /// Owning bill document id, `"pending"` until the bill exists
    pub bill_doc_id: String,
    pub customer_name: String,
    #[serde(rename = "type")]
    pub fulfillment: FulfillmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_order_id: Option<String>,
    pub body: KitchenOrderBody,
    pub subtotal: f64,
    pub total: f64,
    pub status: KitchenOrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, price: f64) -> ItemSnapshot {
        ItemSnapshot {
            item_id: id.to_string(),
            item_name: id.to_uppercase(),
            item_price: price,
        }
    }

    #[test]
    fn test_body_is_tagged() {
        let body = KitchenOrderBody::Single {
            item: snapshot("paneer", 100.0),
            quantity: 2,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "single");
        assert_eq!(json["quantity"], 2);

        let batch: KitchenOrderBody = serde_json::from_value(serde_json::json!({
            "kind": "batch",
            "items": [
                {"item": {"item_id": "a", "item_name": "A", "item_price": 10.0}, "quantity": 1},
                {"item": {"item_id": "b", "item_name": "B", "item_price": 20.0}, "quantity": 3}
            ]
        }))
        .unwrap();
        assert_eq!(batch.total_quantity(), 4);
        assert_eq!(batch.quantity_of("b"), 3);
        assert_eq!(batch.quantity_of("c"), 0);
    }

    #[test]
    fn test_single_quantity_of_other_item_is_zero() {
        let body = KitchenOrderBody::Single {
            item: snapshot("paneer", 100.0),
            quantity: 2,
        };
        assert_eq!(body.quantity_of("paneer"), 2);
        assert_eq!(body.quantity_of("naan"), 0);
        assert_eq!(body.entries().len(), 1);
    }
}
