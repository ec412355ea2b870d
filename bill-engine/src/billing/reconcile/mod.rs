//! Reconciliation Engine
//!
//! Brings the kitchen in line with the cart. A save turns every line's
//! `pending_kot_qty` into kitchen-order writes, then persists the bill.
//!
//! # Save Flow
//!
//! ```text
//! save(cart)
//!     ├─ 1. Preconditions (table, platform id, items, changes), no writes yet
//!     ├─ 2. Plan reductions: walk refs newest → oldest, per-order edits
//!     ├─ 3. Draft new orders (dine-in: one per line, batched: one per save)
//!     ├─ 4. Fan out creates + cancels + rewrites concurrently
//!     ├─ 5. Attach refs, reset deltas, recompute totals
//!     ├─ 6. Update bill, or mint id + create bill + back-fill order refs
//!     └─ 7. Commit to the cart
//! ```
//!
//! Any failing write rolls back the ones that went through (see
//! [`journal`]) and surfaces as [`PersistenceError`](crate::error::PersistenceError).
//! The cart is only touched after every write succeeded.

mod journal;
mod plan;

pub(crate) use journal::{Compensation, Journal};
pub(crate) use plan::OrderWrite;

use super::cart::Cart;
use super::id_gen::{IdGenerator, IdKind};
use crate::error::{BillingError, BillingResult, ValidationError};
use crate::store::{BillRepository, DocumentStore, StoreError, StoreResult};
use crate::utils::money;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use plan::Reductions;
use serde_json::json;
use shared::models::{
    BatchEntry, Bill, BillStatus, KitchenOrder, KitchenOrderBody, KitchenOrderStatus, LineItem,
    OrderRef,
};
use shared::types::{PENDING_BILL_REF, Timestamp};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Result of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub bill_doc_id: String,
    pub display_id: String,
    /// Orders created by this save, bill reference already back-filled
    pub created_orders: Vec<KitchenOrder>,
}

/// A kitchen order about to be created, with the lines it carries
struct OrderDraft {
    /// (line index, quantity)
    lines: Vec<(usize, u32)>,
    order: KitchenOrder,
}

/// Clears the busy flag on drop
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BillingEngine {
    repo: BillRepository,
    ids: IdGenerator,
    /// Set while a write operation runs; a second one fails fast
    busy: AtomicBool,
    clock: fn() -> DateTime<Utc>,
}

impl BillingEngine {
    pub fn new(store: Arc<dyn DocumentStore>, tz: Tz) -> Self {
        let repo = BillRepository::new(store);
        Self {
            ids: IdGenerator::new(repo.clone(), tz),
            repo,
            busy: AtomicBool::new(false),
            clock: Utc::now,
        }
    }

    /// Replace the wall clock (tests)
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &BillRepository {
        &self.repo
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn timezone(&self) -> Tz {
        self.ids.timezone()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub(crate) fn busy(&self) -> Result<BusyGuard<'_>, ValidationError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ValidationError::SaveInProgress)?;
        Ok(BusyGuard(&self.busy))
    }

    /// Load a bill that must still be open
    pub(crate) async fn load_open_bill(&self, doc_id: &str) -> BillingResult<Bill> {
        let bill = self
            .repo
            .get_bill(doc_id)
            .await?
            .ok_or_else(|| BillingError::BillNotFound(doc_id.to_string()))?;
        match bill.status {
            BillStatus::Open => Ok(bill),
            BillStatus::Paid => Err(BillingError::AlreadySettled(doc_id.to_string())),
            BillStatus::Cancelled => Err(BillingError::BillClosed(doc_id.to_string())),
        }
    }

    /// Roll back and turn the journal into the caller's error
    pub(crate) async fn abort(&self, journal: Journal, ts: Timestamp) -> BillingError {
        BillingError::Persistence(journal.rollback(&self.repo, ts).await)
    }

    // =========================================================================
    // Save
    // =========================================================================

    pub async fn save(&self, cart: &mut Cart) -> BillingResult<SaveOutcome> {
        let _guard = self.busy()?;

        if cart.status().is_terminal() {
            return Err(closed_error(cart));
        }
        cart.check_saveable()?;

        let now = self.now();
        let ts = now.timestamp_millis();

        let prior_bill = match cart.bill_doc_id() {
            Some(id) => Some(self.load_open_bill(id).await?),
            None => None,
        };

        let mut lines = cart.items().to_vec();

        // 1. Reductions
        let mut reductions = Reductions::default();
        for line in lines.iter_mut().filter(|l| l.pending_kot_qty < 0) {
            let wanted = line.pending_kot_qty.unsigned_abs();
            let unabsorbed = plan::absorb_reduction(line, wanted, &mut reductions);
            if unabsorbed > 0 {
                warn!(
                    item_id = %line.id,
                    unabsorbed,
                    "Reduction exceeds quantity carried by kitchen orders"
                );
            }
        }
        let writes = self.plan_writes(&reductions).await?;

        // 2. New orders
        let drafts = self.draft_orders(cart, &lines, now).await?;

        // 3. Fan out
        let mut journal = Journal::new();
        let (created, written) =
            futures::join!(self.run_creates(drafts), self.run_writes(writes, ts));
        record_writes(&mut journal, written);
        let mut created = record_creates(&mut journal, created);
        if journal.has_failures() {
            return Err(self.abort(journal, ts).await);
        }

        // 4. Bookkeeping
        for draft in &created {
            for (idx, quantity) in &draft.lines {
                lines[*idx].order_refs.push(OrderRef {
                    order_id: draft.order.order_id.clone(),
                    order_doc_id: draft.order.doc_id.clone(),
                    quantity: *quantity,
                });
            }
        }
        for line in &mut lines {
            line.mark_saved();
        }
        let subtotal_dec = money::subtotal(&lines);
        let subtotal = money::to_f64(subtotal_dec);
        let total = money::to_f64(money::total(subtotal_dec, cart.discount()));

        // 5. Bill
        let (bill_doc_id, display_id) = match prior_bill {
            Some(prior) => {
                let patch = json!({
                    "items": &lines,
                    "subtotal": subtotal,
                    "discount": cart.discount(),
                    "total": total,
                    "customer_name": cart.customer_name(),
                    "platform_order_id": cart.platform_order_id(),
                    "updated_at": ts,
                });
                if let Err(e) = self.repo.update_bill(&prior.doc_id, patch).await {
                    journal.fail(format!("update bill {}", prior.doc_id), e);
                    return Err(self.abort(journal, ts).await);
                }
                journal.record(Compensation::RestoreBill(Box::new(prior.clone())));
                (prior.doc_id, prior.bill_id)
            }
            None => {
                let bill_id = match self.ids.next_id(IdKind::Bill, now).await {
                    Ok(id) => id,
                    Err(e) => {
                        journal.fail("mint bill id", e);
                        return Err(self.abort(journal, ts).await);
                    }
                };
                let bill = Bill {
                    doc_id: String::new(),
                    bill_id: bill_id.clone(),
                    fulfillment: cart.fulfillment(),
                    table_id: cart.table().map(|t| t.doc_id.clone()),
                    table_name: cart.table().map(|t| t.name.clone()),
                    customer_name: cart.customer_name().to_string(),
                    items: lines.clone(),
                    subtotal,
                    discount: cart.discount(),
                    total,
                    status: BillStatus::Open,
                    platform_order_id: cart.platform_order_id().map(str::to_string),
                    payment_method: None,
                    split_payment: None,
                    amount_received: None,
                    change: None,
                    paid_at: None,
                    created_at: ts,
                    updated_at: ts,
                };
                let doc_id = match self.repo.create_bill(&bill).await {
                    Ok(id) => id,
                    Err(e) => {
                        journal.fail(format!("create bill {}", bill_id), e);
                        return Err(self.abort(journal, ts).await);
                    }
                };
                journal.record(Compensation::CancelBill {
                    doc_id: doc_id.clone(),
                });

                // Back-fill bill reference on the orders created above
                let bill_ref = doc_id.as_str();
                let fills = join_all(created.iter().map(|draft| async move {
                    let result = self
                        .repo
                        .set_order_bill_ref(&draft.order.doc_id, bill_ref, ts)
                        .await;
                    (draft.order.doc_id.clone(), result)
                }))
                .await;
                for (order_doc_id, result) in fills {
                    if let Err(e) = result {
                        journal.fail(format!("back-fill order {}", order_doc_id), e);
                    }
                }
                if journal.has_failures() {
                    return Err(self.abort(journal, ts).await);
                }
                for draft in &mut created {
                    draft.order.bill_doc_id = doc_id.clone();
                }
                (doc_id, bill_id)
            }
        };

        info!(
            bill_doc_id = %bill_doc_id,
            bill_id = %display_id,
            created = created.len(),
            subtotal,
            total,
            "Bill saved"
        );

        cart.commit_save(lines.clone(), bill_doc_id.clone(), display_id.clone());

        Ok(SaveOutcome {
            items: lines,
            subtotal,
            discount: cart.discount(),
            total,
            bill_doc_id,
            display_id,
            created_orders: created.into_iter().map(|d| d.order).collect(),
        })
    }

    /// One order per positive line (dine-in) or one batch order for all of
    /// them (take-away / platform)
    async fn draft_orders(
        &self,
        cart: &Cart,
        lines: &[LineItem],
        now: DateTime<Utc>,
    ) -> BillingResult<Vec<OrderDraft>> {
        let positive: Vec<(usize, u32)> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.pending_kot_qty > 0)
            .map(|(idx, l)| (idx, l.pending_kot_qty.unsigned_abs()))
            .collect();
        if positive.is_empty() {
            return Ok(Vec::new());
        }

        let ts = now.timestamp_millis();
        let template = |order_id: String, body: KitchenOrderBody| {
            let subtotal = money::to_f64(money::order_subtotal(&body));
            KitchenOrder {
                doc_id: String::new(),
                order_id,
                bill_doc_id: cart.bill_doc_id().unwrap_or(PENDING_BILL_REF).to_string(),
                customer_name: cart.customer_name().to_string(),
                fulfillment: cart.fulfillment(),
                table_id: cart.table().map(|t| t.doc_id.clone()),
                table_name: cart.table().map(|t| t.name.clone()),
                platform_order_id: cart.platform_order_id().map(str::to_string),
                body,
                subtotal,
                total: subtotal,
                status: KitchenOrderStatus::Pending,
                created_at: ts,
                updated_at: ts,
            }
        };

        if cart.fulfillment().is_batched() {
            let order_id = self.ids.next_id(IdKind::Order, now).await?;
            let body = KitchenOrderBody::Batch {
                items: positive
                    .iter()
                    .map(|(idx, quantity)| BatchEntry {
                        item: plan::snapshot(&lines[*idx]),
                        quantity: *quantity,
                    })
                    .collect(),
            };
            return Ok(vec![OrderDraft {
                order: template(order_id, body),
                lines: positive,
            }]);
        }

        let order_ids = self
            .ids
            .next_ids(IdKind::Order, now, positive.len())
            .await?;
        Ok(positive
            .into_iter()
            .zip(order_ids)
            .map(|((idx, quantity), order_id)| {
                let body = KitchenOrderBody::Single {
                    item: plan::snapshot(&lines[idx]),
                    quantity,
                };
                OrderDraft {
                    order: template(order_id, body),
                    lines: vec![(idx, quantity)],
                }
            })
            .collect())
    }

    /// Load the touched orders once and plan one write per order
    async fn plan_writes(&self, reductions: &Reductions) -> StoreResult<Vec<OrderWrite>> {
        if reductions.is_empty() {
            return Ok(Vec::new());
        }
        let orders = self.repo.get_orders(&reductions.order_ids()).await?;
        Ok(plan::plan_order_writes(orders, reductions))
    }

    async fn run_creates(
        &self,
        drafts: Vec<OrderDraft>,
    ) -> Vec<Result<OrderDraft, (OrderDraft, StoreError)>> {
        join_all(drafts.into_iter().map(|mut draft| async move {
            match self.repo.create_order(&draft.order).await {
                Ok(doc_id) => {
                    draft.order.doc_id = doc_id;
                    Ok(draft)
                }
                Err(e) => Err((draft, e)),
            }
        }))
        .await
    }

    pub(crate) async fn run_writes(
        &self,
        writes: Vec<OrderWrite>,
        ts: Timestamp,
    ) -> Vec<(OrderWrite, StoreResult<()>)> {
        join_all(writes.into_iter().map(|write| async move {
            let result = match &write {
                OrderWrite::Cancel { prior } => {
                    self.repo
                        .set_order_status(&prior.doc_id, KitchenOrderStatus::Cancelled, ts)
                        .await
                }
                OrderWrite::Complete { prior } => {
                    self.repo
                        .set_order_status(&prior.doc_id, KitchenOrderStatus::Completed, ts)
                        .await
                }
                OrderWrite::Rewrite {
                    prior,
                    body,
                    subtotal,
                } => {
                    self.repo
                        .rewrite_order(&prior.doc_id, body, *subtotal, ts)
                        .await
                }
            };
            (write, result)
        }))
        .await
    }

    // =========================================================================
    // Remove / cancel
    // =========================================================================

    /// Remove a line and release every kitchen order quantity it carries
    ///
    /// A persisted bill is rewritten immediately with the remaining lines as
    /// last saved and `total = subtotal - saved discount`.
    pub async fn remove_item(&self, cart: &mut Cart, item_id: &str) -> BillingResult<LineItem> {
        let _guard = self.busy()?;

        if cart.status().is_terminal() {
            return Err(closed_error(cart));
        }
        let mut line = cart
            .line(item_id)
            .cloned()
            .ok_or_else(|| BillingError::ItemNotFound(item_id.to_string()))?;

        let ts = self.now().timestamp_millis();
        let prior_bill = match cart.bill_doc_id() {
            Some(id) => Some(self.load_open_bill(id).await?),
            None => None,
        };

        let mut reductions = Reductions::default();
        plan::release_all(&mut line, &mut reductions);
        let writes = self.plan_writes(&reductions).await?;

        let mut journal = Journal::new();
        let written = self.run_writes(writes, ts).await;
        record_writes(&mut journal, written);
        if journal.has_failures() {
            return Err(self.abort(journal, ts).await);
        }

        if let Some(prior) = prior_bill {
            let remaining: Vec<LineItem> = cart
                .items()
                .iter()
                .filter(|l| l.id != item_id)
                .filter_map(saved_state)
                .collect();
            let subtotal_dec = money::subtotal(&remaining);
            let subtotal = money::to_f64(subtotal_dec);
            let total = money::to_f64(money::total(subtotal_dec, cart.saved_discount()));
            let patch = json!({
                "items": &remaining,
                "subtotal": subtotal,
                "total": total,
                "updated_at": ts,
            });
            if let Err(e) = self.repo.update_bill(&prior.doc_id, patch).await {
                journal.fail(format!("update bill {}", prior.doc_id), e);
                return Err(self.abort(journal, ts).await);
            }
        }

        info!(
            item_id = %item_id,
            bill_doc_id = ?cart.bill_doc_id(),
            released = reductions.order_ids().len(),
            "Item removed"
        );

        Ok(cart.remove_line(item_id).unwrap_or(line))
    }

    /// Cancel the bill and every pending order it references
    ///
    /// A cart that was never saved is simply cleared.
    pub async fn cancel_bill(&self, cart: &mut Cart) -> BillingResult<()> {
        let _guard = self.busy()?;

        let Some(doc_id) = cart.bill_doc_id().map(str::to_string) else {
            cart.clear();
            return Ok(());
        };
        let bill = self.load_open_bill(&doc_id).await?;
        let ts = self.now().timestamp_millis();

        let writes: Vec<OrderWrite> = self
            .repo
            .get_orders(&bill.order_doc_ids())
            .await?
            .into_iter()
            .filter(|o| o.status == KitchenOrderStatus::Pending)
            .map(|prior| OrderWrite::Cancel { prior })
            .collect();

        let mut journal = Journal::new();
        let written = self.run_writes(writes, ts).await;
        record_writes(&mut journal, written);
        if journal.has_failures() {
            return Err(self.abort(journal, ts).await);
        }

        if let Err(e) = self
            .repo
            .set_bill_status(&doc_id, BillStatus::Cancelled, ts)
            .await
        {
            journal.fail(format!("cancel bill {}", doc_id), e);
            return Err(self.abort(journal, ts).await);
        }

        cart.set_status(BillStatus::Cancelled);
        info!(bill_doc_id = %doc_id, bill_id = %bill.bill_id, "Bill cancelled");
        Ok(())
    }
}

pub(crate) fn closed_error(cart: &Cart) -> BillingError {
    let id = cart.bill_doc_id().unwrap_or_default().to_string();
    match cart.status() {
        BillStatus::Paid => BillingError::AlreadySettled(id),
        _ => BillingError::BillClosed(id),
    }
}

/// A line as of its last save; `None` if it was never sent
fn saved_state(line: &LineItem) -> Option<LineItem> {
    if line.original_quantity == 0 {
        return None;
    }
    let mut saved = line.clone();
    saved.quantity = line.original_quantity;
    saved.pending_kot_qty = 0;
    Some(saved)
}

pub(crate) fn record_writes(journal: &mut Journal, results: Vec<(OrderWrite, StoreResult<()>)>) {
    for (write, result) in results {
        match result {
            Ok(()) => journal.record(Compensation::RestoreOrder(Box::new(write.prior().clone()))),
            Err(e) => journal.fail(write.describe(), e),
        }
    }
}

fn record_creates(
    journal: &mut Journal,
    results: Vec<Result<OrderDraft, (OrderDraft, StoreError)>>,
) -> Vec<OrderDraft> {
    let mut created = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(draft) => {
                journal.record(Compensation::CancelOrder {
                    doc_id: draft.order.doc_id.clone(),
                });
                created.push(draft);
            }
            Err((draft, e)) => journal.fail(format!("create order {}", draft.order.order_id), e),
        }
    }
    created
}
