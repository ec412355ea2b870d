//! Compensation journal
//!
//! Every write that went through records its inverse. When a later write
//! fails the journal is replayed newest-first, best-effort, and the outcome
//! is reported as a [`PersistenceError`].

use crate::error::{FailedWrite, PersistenceError};
use crate::store::{BillRepository, StoreResult};
use shared::models::{Bill, BillStatus, KitchenOrder, KitchenOrderStatus};
use shared::types::Timestamp;
use std::fmt::Display;
use tracing::{error, warn};

/// Inverse of one successful write
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Compensation {
    /// Undo an order create (orders are never deleted)
    CancelOrder { doc_id: String },
    /// Undo a status change, rewrite or bill back-fill
    RestoreOrder(Box<KitchenOrder>),
    /// Undo a bill create
    CancelBill { doc_id: String },
    /// Undo a bill update
    RestoreBill(Box<Bill>),
}

impl Compensation {
    fn describe(&self) -> String {
        match self {
            Self::CancelOrder { doc_id } => format!("cancel order {}", doc_id),
            Self::RestoreOrder(order) => format!("restore order {}", order.doc_id),
            Self::CancelBill { doc_id } => format!("cancel bill {}", doc_id),
            Self::RestoreBill(bill) => format!("restore bill {}", bill.doc_id),
        }
    }

    async fn apply(&self, repo: &BillRepository, now: Timestamp) -> StoreResult<()> {
        match self {
            Self::CancelOrder { doc_id } => {
                repo.set_order_status(doc_id, KitchenOrderStatus::Cancelled, now)
                    .await
            }
            Self::RestoreOrder(order) => repo.restore_order(order).await,
            Self::CancelBill { doc_id } => {
                repo.set_bill_status(doc_id, BillStatus::Cancelled, now)
                    .await
            }
            Self::RestoreBill(bill) => repo.restore_bill(bill).await,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    done: Vec<Compensation>,
    failed: Vec<FailedWrite>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, compensation: Compensation) {
        self.done.push(compensation);
    }

    pub fn fail(&mut self, target: impl Into<String>, reason: impl Display) {
        let target = target.into();
        warn!(target_write = %target, reason = %reason, "Write failed");
        self.failed.push(FailedWrite {
            target,
            reason: reason.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Replay inverses newest-first
    pub async fn rollback(self, repo: &BillRepository, now: Timestamp) -> PersistenceError {
        let mut compensated = Vec::new();
        let mut compensation_failed = Vec::new();

        for compensation in self.done.into_iter().rev() {
            let target = compensation.describe();
            match compensation.apply(repo, now).await {
                Ok(()) => compensated.push(target),
                Err(e) => {
                    error!(target_write = %target, error = %e, "Compensation failed");
                    compensation_failed.push(FailedWrite {
                        target,
                        reason: e.to_string(),
                    });
                }
            }
        }

        PersistenceError {
            failed: self.failed,
            compensated,
            compensation_failed,
        }
    }
}
