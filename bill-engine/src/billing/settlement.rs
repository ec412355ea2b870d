//! Payment Settlement
//!
//! Closes an open bill: validates the tender against `subtotal - discount`
//! recomputed from the bill's lines, completes every pending kitchen order,
//! then stamps the payment fields and flips the bill to `paid`.
//!
//! Settlement is not repeatable. A paid bill is rejected with
//! [`BillingError::AlreadySettled`] before anything is written.

use super::cart::Cart;
use super::reconcile::{BillingEngine, Journal, OrderWrite, closed_error, record_writes};
use crate::error::{BillingError, BillingResult, ValidationError};
use crate::utils::money::{self, MONEY_TOLERANCE};
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::{BillStatus, KitchenOrderStatus, PaymentMethod, SplitPayment};
use shared::types::Timestamp;
use std::collections::BTreeMap;
use tracing::info;

/// Money handed over by the customer
#[derive(Debug, Clone, PartialEq)]
pub enum Tender {
    Single { method: PaymentMethod, amount: f64 },
    Split { amounts: BTreeMap<PaymentMethod, f64> },
}

impl Tender {
    pub fn single(method: PaymentMethod, amount: f64) -> Self {
        Self::Single { method, amount }
    }

    pub fn split(amounts: impl IntoIterator<Item = (PaymentMethod, f64)>) -> Self {
        Self::Split {
            amounts: amounts.into_iter().collect(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let check_amount = |method: PaymentMethod, amount: f64| {
            if money::is_valid_amount(amount) {
                Ok(())
            } else {
                Err(ValidationError::InvalidAmount(format!(
                    "{} amount {}",
                    method.label(),
                    amount
                )))
            }
        };
        match self {
            Self::Single { method, amount } => {
                if *method == PaymentMethod::Split {
                    return Err(ValidationError::InvalidPaymentMethod(
                        "split requires a breakdown".to_string(),
                    ));
                }
                check_amount(*method, *amount)
            }
            Self::Split { amounts } => {
                if amounts.is_empty() {
                    return Err(ValidationError::InvalidPaymentMethod(
                        "split tender has no methods".to_string(),
                    ));
                }
                for (method, amount) in amounts {
                    if *method == PaymentMethod::Split {
                        return Err(ValidationError::InvalidPaymentMethod(
                            "split cannot contain split".to_string(),
                        ));
                    }
                    check_amount(*method, *amount)?;
                }
                Ok(())
            }
        }
    }

    fn received(&self) -> Decimal {
        match self {
            Self::Single { amount, .. } => money::to_decimal(*amount),
            Self::Split { amounts } => amounts.values().map(|a| money::to_decimal(*a)).sum(),
        }
    }
}

/// Outcome of a successful settlement
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub bill_doc_id: String,
    pub bill_id: String,
    pub status: BillStatus,
    pub payment_method: PaymentMethod,
    pub split_payment: Option<SplitPayment>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub amount_received: f64,
    pub change: f64,
    pub paid_at: Timestamp,
    /// Kitchen orders moved to `completed`
    pub completed_orders: usize,
}

impl BillingEngine {
    pub async fn settle(&self, bill_doc_id: &str, tender: Tender) -> BillingResult<Settlement> {
        let _guard = self.busy()?;

        let bill = self.load_open_bill(bill_doc_id).await?;
        if bill.items.is_empty() {
            return Err(ValidationError::NoItems.into());
        }
        tender.validate()?;

        let subtotal_dec = money::subtotal(&bill.items);
        let total_dec = money::total(subtotal_dec, bill.discount);
        if total_dec < Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(format!(
                "discount {} exceeds subtotal {}",
                bill.discount,
                money::to_f64(subtotal_dec)
            ))
            .into());
        }
        let received_dec = tender.received();
        if total_dec - received_dec >= MONEY_TOLERANCE {
            return Err(BillingError::InsufficientPayment {
                required: money::to_f64(total_dec),
                tendered: money::to_f64(received_dec),
            });
        }
        let change_dec = (received_dec - total_dec).max(Decimal::ZERO);

        let (payment_method, split_payment) = match &tender {
            Tender::Single { method, .. } => (*method, None),
            Tender::Split { amounts } => (
                PaymentMethod::Split,
                Some(SplitPayment {
                    amounts: amounts.clone(),
                }),
            ),
        };

        let paid_at = self.now().timestamp_millis();
        let repo = self.repository();

        // Orders referenced by the lines plus any carrying this bill's id
        let mut orders = repo.get_orders(&bill.order_doc_ids()).await?;
        for order in repo.orders_for_bill(bill_doc_id).await? {
            if !orders.iter().any(|o| o.doc_id == order.doc_id) {
                orders.push(order);
            }
        }
        let writes: Vec<OrderWrite> = orders
            .into_iter()
            .filter(|o| o.status == KitchenOrderStatus::Pending)
            .map(|prior| OrderWrite::Complete { prior })
            .collect();
        let completed_orders = writes.len();

        let mut journal = Journal::new();
        let written = self.run_writes(writes, paid_at).await;
        record_writes(&mut journal, written);
        if journal.has_failures() {
            return Err(self.abort(journal, paid_at).await);
        }

        let subtotal = money::to_f64(subtotal_dec);
        let total = money::to_f64(total_dec);
        let amount_received = money::to_f64(received_dec);
        let change = money::to_f64(change_dec);

        let patch = json!({
            "status": BillStatus::Paid,
            "payment_method": payment_method,
            "split_payment": &split_payment,
            "amount_received": amount_received,
            "change": change,
            "paid_at": paid_at,
            "subtotal": subtotal,
            "total": total,
            "updated_at": paid_at,
        });
        if let Err(e) = repo.update_bill(bill_doc_id, patch).await {
            journal.fail(format!("settle bill {}", bill_doc_id), e);
            return Err(self.abort(journal, paid_at).await);
        }

        info!(
            bill_doc_id = %bill_doc_id,
            bill_id = %bill.bill_id,
            method = payment_method.label(),
            total,
            amount_received,
            change,
            completed_orders,
            "Bill settled"
        );

        Ok(Settlement {
            bill_doc_id: bill_doc_id.to_string(),
            bill_id: bill.bill_id,
            status: BillStatus::Paid,
            payment_method,
            split_payment,
            subtotal,
            discount: bill.discount,
            total,
            amount_received,
            change,
            paid_at,
            completed_orders,
        })
    }

    /// Settle the bill behind a cart; the cart must be fully saved
    pub async fn settle_cart(&self, cart: &mut Cart, tender: Tender) -> BillingResult<Settlement> {
        if cart.status().is_terminal() {
            return Err(closed_error(cart));
        }
        let Some(bill_doc_id) = cart.bill_doc_id().map(str::to_string) else {
            return Err(ValidationError::UnsavedChanges.into());
        };
        if cart.has_pending_changes() {
            return Err(ValidationError::UnsavedChanges.into());
        }

        let settlement = self.settle(&bill_doc_id, tender).await?;
        cart.set_status(BillStatus::Paid);
        Ok(settlement)
    }
}
