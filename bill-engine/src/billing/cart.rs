//! Cart Model
//!
//! The editable, in-memory side of a bill. Quantity edits only touch the
//! cart; nothing reaches the store until the reconciliation engine saves it.
//!
//! Every quantity change recomputes the line's `pending_kot_qty`. A line can
//! never reach zero through a quantity edit: going below one requires the
//! explicit removal flow (see [`super::removal`]).

use crate::error::{BillingError, BillingResult, ValidationError};
use crate::utils::money;
use shared::models::{Bill, BillStatus, DiningTable, FulfillmentType, LineItem, MenuItem};
use shared::types::DEFAULT_CUSTOMER_NAME;

/// Result of a decrement request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    Decremented { quantity: u32 },
    /// The line is at 1; removing it needs confirmation. Cart unchanged.
    RequiresConfirmation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    fulfillment: FulfillmentType,
    table: Option<DiningTable>,
    customer_name: String,
    platform_order_id: Option<String>,
    items: Vec<LineItem>,
    discount: f64,
    /// Discount as of the last successful save
    saved_discount: f64,
    bill_doc_id: Option<String>,
    display_id: Option<String>,
    status: BillStatus,
}

impl Cart {
    pub fn new(fulfillment: FulfillmentType) -> Self {
        Self {
            fulfillment,
            table: None,
            customer_name: DEFAULT_CUSTOMER_NAME.to_string(),
            platform_order_id: None,
            items: Vec::new(),
            discount: 0.0,
            saved_discount: 0.0,
            bill_doc_id: None,
            display_id: None,
            status: BillStatus::Open,
        }
    }

    /// Fresh dine-in cart bound to a table
    pub fn for_table(table: DiningTable) -> Self {
        let mut cart = Self::new(FulfillmentType::DineIn);
        cart.table = Some(table);
        cart
    }

    /// Resume a persisted bill
    pub fn from_bill(bill: &Bill, table: Option<DiningTable>) -> Self {
        let mut items = bill.items.clone();
        for item in &mut items {
            item.recompute_pending();
        }
        Self {
            fulfillment: bill.fulfillment,
            table,
            customer_name: bill.customer_name.clone(),
            platform_order_id: bill.platform_order_id.clone(),
            items,
            discount: bill.discount,
            saved_discount: bill.discount,
            bill_doc_id: Some(bill.doc_id.clone()),
            display_id: Some(bill.bill_id.clone()),
            status: bill.status,
        }
    }

    // ========== Accessors ==========

    pub fn fulfillment(&self) -> FulfillmentType {
        self.fulfillment
    }

    pub fn table(&self) -> Option<&DiningTable> {
        self.table.as_ref()
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn platform_order_id(&self) -> Option<&str> {
        self.platform_order_id.as_deref()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn line(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn saved_discount(&self) -> f64 {
        self.saved_discount
    }

    pub fn bill_doc_id(&self) -> Option<&str> {
        self.bill_doc_id.as_deref()
    }

    pub fn display_id(&self) -> Option<&str> {
        self.display_id.as_deref()
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn is_persisted(&self) -> bool {
        self.bill_doc_id.is_some()
    }

    pub fn subtotal(&self) -> f64 {
        money::to_f64(money::subtotal(&self.items))
    }

    pub fn total(&self) -> f64 {
        money::to_f64(money::total(money::subtotal(&self.items), self.discount))
    }

    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Lines with quantity not yet sent to the kitchen
    pub fn pending_items(&self) -> Vec<&LineItem> {
        self.items.iter().filter(|i| i.pending_kot_qty > 0).collect()
    }

    /// Any unsaved quantity delta or discount edit
    pub fn has_pending_changes(&self) -> bool {
        self.items.iter().any(|i| i.pending_kot_qty != 0)
            || !money::money_eq(self.discount, self.saved_discount)
    }

    // ========== Edits ==========

    /// Add one of `item`; an existing line is incremented instead
    pub fn add_item(&mut self, item: &MenuItem) -> u32 {
        if let Some(line) = self.items.iter_mut().find(|l| l.id == item.doc_id) {
            line.quantity += 1;
            line.recompute_pending();
            return line.quantity;
        }
        self.items.push(LineItem::from_menu(item));
        1
    }

    pub fn increment(&mut self, item_id: &str) -> BillingResult<u32> {
        let line = self.line_mut(item_id)?;
        line.quantity += 1;
        line.recompute_pending();
        Ok(line.quantity)
    }

    pub fn decrement(&mut self, item_id: &str) -> BillingResult<DecrementOutcome> {
        let line = self.line_mut(item_id)?;
        if line.quantity <= 1 {
            return Ok(DecrementOutcome::RequiresConfirmation);
        }
        line.quantity -= 1;
        line.recompute_pending();
        Ok(DecrementOutcome::Decremented {
            quantity: line.quantity,
        })
    }

    /// Set an explicit quantity (>= 1)
    pub fn set_quantity(&mut self, item_id: &str, quantity: u32) -> BillingResult<()> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(
                "quantity must be at least 1; remove the item instead".to_string(),
            )
            .into());
        }
        let line = self.line_mut(item_id)?;
        line.quantity = quantity;
        line.recompute_pending();
        Ok(())
    }

    pub fn set_discount(&mut self, discount: f64) -> Result<(), ValidationError> {
        if !money::is_valid_amount(discount) {
            return Err(ValidationError::InvalidAmount(format!(
                "discount {} out of range",
                discount
            )));
        }
        self.discount = discount;
        Ok(())
    }

    /// Change fulfillment type; only allowed before the first save
    pub fn set_fulfillment(&mut self, fulfillment: FulfillmentType) -> Result<(), ValidationError> {
        if self.is_persisted() && fulfillment != self.fulfillment {
            return Err(ValidationError::FulfillmentLocked);
        }
        self.fulfillment = fulfillment;
        if fulfillment != FulfillmentType::DineIn {
            self.table = None;
        }
        if !fulfillment.is_platform() {
            self.platform_order_id = None;
        }
        Ok(())
    }

    /// Bind a table; only allowed before the first save
    pub fn set_table(&mut self, table: Option<DiningTable>) -> Result<(), ValidationError> {
        let same = match (&self.table, &table) {
            (Some(a), Some(b)) => a.doc_id == b.doc_id,
            (None, None) => true,
            _ => false,
        };
        if self.is_persisted() && !same {
            return Err(ValidationError::TableLocked);
        }
        self.table = table;
        Ok(())
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let trimmed = name.trim();
        self.customer_name = if trimmed.is_empty() {
            DEFAULT_CUSTOMER_NAME.to_string()
        } else {
            trimmed.to_string()
        };
    }

    pub fn set_platform_order_id(&mut self, id: Option<String>) {
        self.platform_order_id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    /// Save preconditions, in the order the cashier sees them
    pub fn check_saveable(&self) -> Result<(), ValidationError> {
        if self.fulfillment == FulfillmentType::DineIn && self.table.is_none() {
            return Err(ValidationError::TableRequired);
        }
        if self.fulfillment.is_platform() && self.platform_order_id.is_none() {
            return Err(ValidationError::PlatformIdRequired);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        let subtotal = money::subtotal(&self.items);
        if money::to_decimal(self.discount) > subtotal {
            return Err(ValidationError::InvalidAmount(format!(
                "discount {} exceeds subtotal {}",
                self.discount,
                money::to_f64(subtotal)
            )));
        }
        if !self.has_pending_changes() {
            return Err(ValidationError::NoChanges);
        }
        Ok(())
    }

    // ========== Engine-side mutations ==========

    fn line_mut(&mut self, item_id: &str) -> BillingResult<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|l| l.id == item_id)
            .ok_or_else(|| BillingError::ItemNotFound(item_id.to_string()))
    }

    /// Install the reconciled lines and bill identity after a save
    pub(crate) fn commit_save(
        &mut self,
        items: Vec<LineItem>,
        bill_doc_id: String,
        display_id: String,
    ) {
        self.items = items;
        self.saved_discount = self.discount;
        self.bill_doc_id = Some(bill_doc_id);
        self.display_id = Some(display_id);
    }

    pub(crate) fn remove_line(&mut self, item_id: &str) -> Option<LineItem> {
        let pos = self.items.iter().position(|l| l.id == item_id)?;
        Some(self.items.remove(pos))
    }

    pub(crate) fn set_status(&mut self, status: BillStatus) {
        self.status = status;
    }

    /// Drop every line and the bill identity
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.discount = 0.0;
        self.saved_discount = 0.0;
        self.bill_doc_id = None;
        self.display_id = None;
        self.status = BillStatus::Open;
    }
}
