//! 集成测试公共工具
//!
//! `FlakyStore` wraps the in-memory store and fails chosen writes so the
//! rollback paths can be driven from the outside.

#![allow(dead_code)]

use async_trait::async_trait;
use bill_engine::BillingEngine;
use bill_engine::store::{
    BillRepository, Document, DocumentStore, MemoryStore, Query, StoreError, StoreResult,
    collections,
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use shared::models::{DiningTable, KitchenOrder, MenuItem};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 2025-03-05 19:45 IST
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 14, 15, 0).unwrap()
}

pub fn menu(id: &str, price: f64) -> MenuItem {
    MenuItem {
        doc_id: id.to_string(),
        name: id.to_string(),
        price,
        item_type: None,
        category: None,
    }
}

pub fn table(id: &str) -> DiningTable {
    DiningTable::new(id, format!("Table {}", id), id)
}

pub fn engine_on(store: Arc<dyn DocumentStore>) -> BillingEngine {
    BillingEngine::new(store, chrono_tz::Asia::Kolkata).with_clock(fixed_now)
}

/// Every kitchen order in the store, whatever bill it belongs to
pub async fn all_orders(store: &dyn DocumentStore) -> Vec<KitchenOrder> {
    let docs = store.query(&Query::new(collections::ORDERS)).await.unwrap();
    BillRepository::decode_orders(docs).unwrap()
}

#[derive(Default)]
struct Faults {
    creates_in: HashSet<String>,
    updates_of: HashSet<String>,
}

/// Memory store with injectable write failures
pub struct FlakyStore {
    inner: MemoryStore,
    faults: Mutex<Faults>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Fail every create in `collection`
    pub fn fail_creates_in(&self, collection: &str) {
        self.faults.lock().creates_in.insert(collection.to_string());
    }

    /// Fail every update of document `id`
    pub fn fail_updates_of(&self, id: &str) {
        self.faults.lock().updates_of.insert(id.to_string());
    }

    pub fn heal(&self) {
        *self.faults.lock() = Faults::default();
    }

    pub fn len(&self, collection: &str) -> usize {
        self.inner.len(collection)
    }
}

fn injected(what: String) -> StoreError {
    StoreError::Unavailable(format!("injected failure: {}", what))
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String> {
        if self.faults.lock().creates_in.contains(collection) {
            return Err(injected(format!("create in {}", collection)));
        }
        self.inner.create(collection, data).await
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.inner.set(collection, id, data).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        if self.faults.lock().updates_of.contains(id) {
            return Err(injected(format!("update {}/{}", collection, id)));
        }
        self.inner.update(collection, id, patch).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.inner.query(query).await
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.inner.changes()
    }
}
