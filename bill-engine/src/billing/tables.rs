//! Table selection / multi-bill resolution
//!
//! A table may carry several open bills at once. Selecting a table never
//! resumes or merges anything on its own: with open bills present the
//! cashier has to pick one or explicitly start another.

use super::cart::Cart;
use super::reconcile::BillingEngine;
use crate::error::{BillingError, BillingResult};
use shared::models::{Bill, DiningTable};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    /// No open bills: start fresh
    New,
    /// Open bills exist: caller must choose
    Choose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSelection {
    pub table: DiningTable,
    pub action: SelectionAction,
    /// Open bills, oldest first
    pub bills: Vec<Bill>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableChoice {
    /// Resume the open bill with this document id
    Resume(String),
    StartNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    Resume,
    New,
}

impl TableSelection {
    /// Cart for a fresh table with no open bills
    pub fn new_cart(&self) -> Option<Cart> {
        match self.action {
            SelectionAction::New => Some(Cart::for_table(self.table.clone())),
            SelectionAction::Choose => None,
        }
    }

    pub fn choose(&self, choice: TableChoice) -> BillingResult<(TableAction, Cart)> {
        match choice {
            TableChoice::StartNew => Ok((TableAction::New, Cart::for_table(self.table.clone()))),
            TableChoice::Resume(doc_id) => {
                let bill = self
                    .bills
                    .iter()
                    .find(|b| b.doc_id == doc_id)
                    .ok_or(BillingError::BillNotFound(doc_id))?;
                Ok((
                    TableAction::Resume,
                    Cart::from_bill(bill, Some(self.table.clone())),
                ))
            }
        }
    }
}

impl BillingEngine {
    pub async fn select_table(&self, table: &DiningTable) -> BillingResult<TableSelection> {
        let bills = self.repository().open_bills_for_table(&table.doc_id).await?;
        let action = if bills.is_empty() {
            SelectionAction::New
        } else {
            SelectionAction::Choose
        };
        debug!(table_id = %table.doc_id, open_bills = bills.len(), ?action, "Table selected");
        Ok(TableSelection {
            table: table.clone(),
            action,
            bills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::{FulfillmentType, MenuItem};
    use std::sync::Arc;

    fn menu(id: &str, price: f64) -> MenuItem {
        MenuItem {
            doc_id: id.to_string(),
            name: id.to_string(),
            price,
            item_type: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_empty_table_starts_new() {
        let engine = BillingEngine::new(Arc::new(MemoryStore::new()), chrono_tz::Asia::Kolkata);
        let table = DiningTable::new("t9", "Table 9", "t9");
        let selection = engine.select_table(&table).await.unwrap();
        assert_eq!(selection.action, SelectionAction::New);

        let cart = selection.new_cart().unwrap();
        assert_eq!(cart.fulfillment(), FulfillmentType::DineIn);
        assert_eq!(cart.table().unwrap().short_code, "T9");
    }

    #[tokio::test]
    async fn test_resume_loads_bill() {
        let engine = BillingEngine::new(Arc::new(MemoryStore::new()), chrono_tz::Asia::Kolkata);
        let table = DiningTable::new("t1", "Table 1", "t1");
        let mut cart = Cart::for_table(table.clone());
        cart.add_item(&menu("paneer", 100.0));
        cart.set_discount(10.0).unwrap();
        let saved = engine.save(&mut cart).await.unwrap();

        let selection = engine.select_table(&table).await.unwrap();
        assert_eq!(selection.action, SelectionAction::Choose);
        assert!(selection.new_cart().is_none());

        let (action, resumed) = selection
            .choose(TableChoice::Resume(saved.bill_doc_id.clone()))
            .unwrap();
        assert_eq!(action, TableAction::Resume);
        assert_eq!(resumed.display_id(), Some(saved.display_id.as_str()));
        assert_eq!(resumed.discount(), 10.0);
        assert!(!resumed.has_pending_changes());

        let (action, fresh) = selection.choose(TableChoice::StartNew).unwrap();
        assert_eq!(action, TableAction::New);
        assert!(fresh.items().is_empty());

        assert!(matches!(
            selection.choose(TableChoice::Resume("other".into())),
            Err(BillingError::BillNotFound(_))
        ));
    }
}
