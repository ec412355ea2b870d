//! Bill / Order Repository
//!
//! Typed reads and writes over a [`DocumentStore`]. Every method is a single
//! store call (or a read followed by one write); multi-document consistency
//! is the caller's concern.

use super::{
    Direction, Document, DocumentStore, Filter, Query, StoreError, StoreResult, Subscription,
    collections, listen,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::models::{
    Bill, BillStatus, DiningTable, KitchenOrder, KitchenOrderBody, KitchenOrderStatus, MenuItem,
};
use shared::types::Timestamp;
use std::sync::Arc;

/// Records whose store id lives outside the JSON body
trait StoredRecord: DeserializeOwned {
    fn set_doc_id(&mut self, id: String);
}

impl StoredRecord for Bill {
    fn set_doc_id(&mut self, id: String) {
        self.doc_id = id;
    }
}

impl StoredRecord for KitchenOrder {
    fn set_doc_id(&mut self, id: String) {
        self.doc_id = id;
    }
}

impl StoredRecord for DiningTable {
    fn set_doc_id(&mut self, id: String) {
        self.doc_id = id;
    }
}

impl StoredRecord for MenuItem {
    fn set_doc_id(&mut self, id: String) {
        self.doc_id = id;
    }
}

fn decode<T: StoredRecord>(doc: Document) -> StoreResult<T> {
    let mut record: T = doc.decode()?;
    record.set_doc_id(doc.id);
    Ok(record)
}

fn encode<T: Serialize>(record: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(record)?)
}

#[derive(Clone)]
pub struct BillRepository {
    store: Arc<dyn DocumentStore>,
}

impl BillRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Documents of `collection` with `start <= created_at < end`
    pub async fn count_created_between(
        &self,
        collection: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> StoreResult<usize> {
        let query = Query::new(collection)
            .filter(Filter::gte("created_at", start))
            .filter(Filter::lt("created_at", end));
        self.store.count(&query).await
    }

    // =========================================================================
    // Bills
    // =========================================================================

    pub async fn create_bill(&self, bill: &Bill) -> StoreResult<String> {
        self.store.create(collections::BILLS, encode(bill)?).await
    }

    /// Shallow-merge a patch into the bill
    pub async fn update_bill(&self, doc_id: &str, patch: Value) -> StoreResult<()> {
        self.store.update(collections::BILLS, doc_id, patch).await
    }

    /// Overwrite the whole bill document (compensation)
    pub async fn restore_bill(&self, bill: &Bill) -> StoreResult<()> {
        self.store
            .set(collections::BILLS, &bill.doc_id, encode(bill)?)
            .await
    }

    pub async fn get_bill(&self, doc_id: &str) -> StoreResult<Option<Bill>> {
        self.store
            .get(collections::BILLS, doc_id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn set_bill_status(
        &self,
        doc_id: &str,
        status: BillStatus,
        now: Timestamp,
    ) -> StoreResult<()> {
        self.update_bill(doc_id, json!({ "status": status, "updated_at": now }))
            .await
    }

    /// Open bills of a table, oldest first
    pub async fn open_bills_for_table(&self, table_id: &str) -> StoreResult<Vec<Bill>> {
        let query = Query::new(collections::BILLS)
            .filter(Filter::eq("table_id", table_id))
            .filter(Filter::eq("status", json!(BillStatus::Open)))
            .order_by("created_at", Direction::Asc);
        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    // =========================================================================
    // Kitchen orders
    // =========================================================================

    pub async fn create_order(&self, order: &KitchenOrder) -> StoreResult<String> {
        self.store.create(collections::ORDERS, encode(order)?).await
    }

    pub async fn get_order(&self, doc_id: &str) -> StoreResult<Option<KitchenOrder>> {
        self.store
            .get(collections::ORDERS, doc_id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Load several orders; a missing one is an error
    pub async fn get_orders(&self, doc_ids: &[String]) -> StoreResult<Vec<KitchenOrder>> {
        let mut orders = Vec::with_capacity(doc_ids.len());
        for id in doc_ids {
            let order = self
                .get_order(id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    collection: collections::ORDERS.to_string(),
                    id: id.clone(),
                })?;
            orders.push(order);
        }
        Ok(orders)
    }

    /// Orders whose bill reference points at `bill_doc_id`
    pub async fn orders_for_bill(&self, bill_doc_id: &str) -> StoreResult<Vec<KitchenOrder>> {
        let query = Query::new(collections::ORDERS)
            .filter(Filter::eq("bill_doc_id", bill_doc_id))
            .order_by("created_at", Direction::Asc);
        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn set_order_status(
        &self,
        doc_id: &str,
        status: KitchenOrderStatus,
        now: Timestamp,
    ) -> StoreResult<()> {
        self.store
            .update(
                collections::ORDERS,
                doc_id,
                json!({ "status": status, "updated_at": now }),
            )
            .await
    }

    /// Replace the body of a pending order after a reduction
    pub async fn rewrite_order(
        &self,
        doc_id: &str,
        body: &KitchenOrderBody,
        subtotal: f64,
        now: Timestamp,
    ) -> StoreResult<()> {
        self.store
            .update(
                collections::ORDERS,
                doc_id,
                json!({
                    "body": body,
                    "subtotal": subtotal,
                    "total": subtotal,
                    "updated_at": now,
                }),
            )
            .await
    }

    /// Back-fill the owning bill reference
    pub async fn set_order_bill_ref(
        &self,
        doc_id: &str,
        bill_doc_id: &str,
        now: Timestamp,
    ) -> StoreResult<()> {
        self.store
            .update(
                collections::ORDERS,
                doc_id,
                json!({ "bill_doc_id": bill_doc_id, "updated_at": now }),
            )
            .await
    }

    /// Overwrite the whole order document (compensation)
    pub async fn restore_order(&self, order: &KitchenOrder) -> StoreResult<()> {
        self.store
            .set(collections::ORDERS, &order.doc_id, encode(order)?)
            .await
    }

    /// Kitchen marks a ticket done. Returns `false` when the order is no
    /// longer pending.
    pub async fn complete_order(&self, doc_id: &str, now: Timestamp) -> StoreResult<bool> {
        let order = self
            .get_order(doc_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collections::ORDERS.to_string(),
                id: doc_id.to_string(),
            })?;
        if order.status != KitchenOrderStatus::Pending {
            return Ok(false);
        }
        self.set_order_status(doc_id, KitchenOrderStatus::Completed, now)
            .await?;
        Ok(true)
    }

    /// Live kitchen feed: orders with the given status, oldest first
    pub fn watch_orders(&self, status: KitchenOrderStatus) -> Subscription {
        let query = Query::new(collections::ORDERS)
            .filter(Filter::eq("status", json!(status)))
            .order_by("created_at", Direction::Asc);
        listen(self.store.clone(), query)
    }

    /// Decode a kitchen feed snapshot
    pub fn decode_orders(docs: Vec<Document>) -> StoreResult<Vec<KitchenOrder>> {
        docs.into_iter().map(decode).collect()
    }

    // =========================================================================
    // Tables & menu
    // =========================================================================

    pub async fn create_table(&self, table: &DiningTable) -> StoreResult<String> {
        self.store.create(collections::TABLES, encode(table)?).await
    }

    pub async fn get_table(&self, doc_id: &str) -> StoreResult<Option<DiningTable>> {
        self.store
            .get(collections::TABLES, doc_id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn list_tables(&self) -> StoreResult<Vec<DiningTable>> {
        let query = Query::new(collections::TABLES).order_by("name", Direction::Asc);
        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn create_menu_item(&self, item: &MenuItem) -> StoreResult<String> {
        self.store
            .create(collections::MENU_ITEMS, encode(item)?)
            .await
    }

    pub async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
        let query = Query::new(collections::MENU_ITEMS).order_by("name", Direction::Asc);
        self.store
            .query(&query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}
