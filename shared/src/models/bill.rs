//! Bill Model

use super::LineItem;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 履约类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FulfillmentType {
    /// 堂食
    #[default]
    DineIn,
    /// 打包
    TakeAway,
    /// Delivery aggregator
    Swiggy,
    /// Delivery aggregator
    Zomato,
}

impl FulfillmentType {
    /// Aggregator channels require an externally issued order id
    pub fn is_platform(&self) -> bool {
        matches!(self, Self::Swiggy | Self::Zomato)
    }

    /// Everything but dine-in sends one kitchen order per save
    pub fn is_batched(&self) -> bool {
        !matches!(self, Self::DineIn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "dine-in",
            Self::TakeAway => "take-away",
            Self::Swiggy => "swiggy",
            Self::Zomato => "zomato",
        }
    }

    /// Label printed on receipts and tickets
    pub fn label(&self) -> &'static str {
        match self {
            Self::DineIn => "Dine In",
            Self::TakeAway => "Take Away",
            Self::Swiggy => "Swiggy",
            Self::Zomato => "Zomato",
        }
    }
}

/// 账单状态: open → paid | open → cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Open,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    /// Several tender methods; breakdown in [`SplitPayment`]
    Split,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::Upi => "UPI",
            Self::Split => "Split",
        }
    }
}

/// Split tender breakdown (method → amount)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SplitPayment {
    pub amounts: BTreeMap<PaymentMethod, f64>,
}

impl SplitPayment {
    /// Methods that actually carried money
    pub fn methods(&self) -> Vec<PaymentMethod> {
        self.amounts
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(method, _)| *method)
            .collect()
    }

    pub fn amount(&self, method: PaymentMethod) -> f64 {
        self.amounts.get(&method).copied().unwrap_or(0.0)
    }
}

/// Bill document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(default, skip_serializing)]
    pub doc_id: String,
    /// Human-readable id (`#B-DDMMYYYY-N`), assigned once
    pub bill_id: String,
    #[serde(rename = "type")]
    pub fulfillment: FulfillmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_order_id: Option<String>,

    // === Payment ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_payment: Option<SplitPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Bill {
    /// Every kitchen order document referenced by the bill's lines
    pub fn order_doc_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for r in self.items.iter().flat_map(|i| i.order_refs.iter()) {
            if !ids.contains(&r.order_doc_id) {
                ids.push(r.order_doc_id.clone());
            }
        }
        ids
    }

    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_wire_names() {
        assert_eq!(
            serde_json::to_value(FulfillmentType::DineIn).unwrap(),
            "dine-in"
        );
        assert_eq!(
            serde_json::to_value(FulfillmentType::TakeAway).unwrap(),
            "take-away"
        );
        let t: FulfillmentType = serde_json::from_str("\"zomato\"").unwrap();
        assert!(t.is_platform());
        assert!(t.is_batched());
        assert!(!FulfillmentType::DineIn.is_batched());
        assert!(!FulfillmentType::TakeAway.is_platform());
    }

    #[test]
    fn test_split_methods_skip_zero() {
        let mut split = SplitPayment::default();
        split.amounts.insert(PaymentMethod::Cash, 100.0);
        split.amounts.insert(PaymentMethod::Card, 0.0);
        split.amounts.insert(PaymentMethod::Upi, 50.0);
        assert_eq!(split.methods(), vec![PaymentMethod::Cash, PaymentMethod::Upi]);
        assert_eq!(split.amount(PaymentMethod::Card), 0.0);

        let json = serde_json::to_value(&split).unwrap();
        assert_eq!(json["amounts"]["upi"], 50.0);
    }

    #[test]
    fn test_doc_id_not_serialized() {
        let bill = Bill {
            doc_id: "doc-1".to_string(),
            bill_id: "#B-01012025-1".to_string(),
            fulfillment: FulfillmentType::TakeAway,
            table_id: None,
            table_name: None,
            customer_name: "Guest".to_string(),
            items: vec![],
            subtotal: 0.0,
            discount: 0.0,
            total: 0.0,
            status: BillStatus::Open,
            platform_order_id: None,
            payment_method: None,
            split_payment: None,
            amount_received: None,
            change: None,
            paid_at: None,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&bill).unwrap();
        assert!(json.get("doc_id").is_none());
        assert!(json.get("table_id").is_none());
        assert_eq!(json["type"], "take-away");
        assert_eq!(json["status"], "open");
    }
}
