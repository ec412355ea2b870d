//! Document store abstraction
//!
//! The billing core only needs a narrow slice of a document database:
//! create, shallow-merge update, point reads, filtered/ordered queries and
//! change subscriptions. Implementations:
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`MemoryStore`] | `HashMap` behind `parking_lot::RwLock` | tests, demo terminals |
//! | [`RedbStore`] | redb file, JSON documents keyed by `(collection, id)` | durable local store |
//!
//! Writes are last-write-wins per document. There are no multi-document
//! transactions; callers that touch several documents compensate on failure.

mod error;
pub mod memory;
pub mod redb_store;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use repository::BillRepository;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Collection names
pub mod collections {
    pub const BILLS: &str = "bills";
    pub const ORDERS: &str = "orders";
    pub const TABLES: &str = "tables";
    pub const MENU_ITEMS: &str = "menu_items";
    pub const STAFF: &str = "staff";
    pub const CREDENTIALS: &str = "credentials";
}

/// Capacity of the change-notification channel
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A stored document: store-assigned id plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Top-level field lookup
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Field predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lt(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq(field.to_string(), value.into())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::Gte(field.to_string(), value.into())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::Lt(field.to_string(), value.into())
    }

    /// Missing fields never match
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Self::Eq(field, expected) => data.get(field) == Some(expected),
            Self::Gte(field, bound) => data
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o != Ordering::Less),
            Self::Lt(field, bound) => data
                .get(field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o == Ordering::Less),
        }
    }
}

/// Numbers compare numerically, strings lexicographically, anything else
/// is incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Collection query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
    /// Cursor: skip up to and including this document id
    pub start_after: Option<String>,
}

impl Query {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, doc_id: impl Into<String>) -> Self {
        self.start_after = Some(doc_id.into());
        self
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }

    /// Filter, order, paginate an unordered set of documents
    ///
    /// Ties (and unordered queries) fall back to document id order so
    /// cursors are stable.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut result: Vec<Document> = docs.into_iter().filter(|d| self.matches(&d.data)).collect();

        result.sort_by(|a, b| {
            let by_field = match &self.order_by {
                Some((field, direction)) => {
                    let o = match (a.data.get(field), b.data.get(field)) {
                        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    if *direction == Direction::Desc {
                        o.reverse()
                    } else {
                        o
                    }
                }
                None => Ordering::Equal,
            };
            by_field.then_with(|| a.id.cmp(&b.id))
        });

        if let Some(cursor) = &self.start_after
            && let Some(pos) = result.iter().position(|d| &d.id == cursor)
        {
            result.drain(..=pos);
        }

        if let Some(limit) = self.limit {
            result.truncate(limit);
        }
        result
    }
}

/// Shallow merge: top-level keys of `patch` replace those of `target`
pub(crate) fn merge_patch(target: &mut Value, patch: Value) -> StoreResult<()> {
    let Value::Object(patch) = patch else {
        return Err(StoreError::InvalidPatch("patch must be a JSON object".into()));
    };
    let Value::Object(target) = target else {
        return Err(StoreError::InvalidPatch("document is not a JSON object".into()));
    };
    for (key, value) in patch {
        target.insert(key, value);
    }
    Ok(())
}

/// Document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning its store-assigned id
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String>;

    /// Insert or replace a document under a caller-chosen id
    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    /// Shallow-merge `patch` into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    async fn count(&self, query: &Query) -> StoreResult<usize> {
        Ok(self.query(query).await?.len())
    }

    /// Receiver of collection names, one message per committed write
    fn changes(&self) -> broadcast::Receiver<String>;
}

/// Live query: yields the matching set now, then again after every write
/// to the collection.
pub struct Subscription {
    store: Arc<dyn DocumentStore>,
    query: Query,
    changes: broadcast::Receiver<String>,
    primed: bool,
}

impl Subscription {
    /// Next snapshot. The first call returns immediately; later calls wait
    /// for a write to the collection.
    ///
    /// The subscription holds the store, so the stream does not end on its
    /// own. `None` only follows a store closing its change channel.
    pub async fn next(&mut self) -> Option<StoreResult<Vec<Document>>> {
        if self.primed {
            loop {
                match self.changes.recv().await {
                    Ok(collection) if collection == self.query.collection => break,
                    Ok(_) => continue,
                    // Missed notifications: a fresh snapshot covers them
                    Err(broadcast::error::RecvError::Lagged(_)) => break,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }
        self.primed = true;
        Some(self.store.query(&self.query).await)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// Subscribe to a query
pub fn listen(store: Arc<dyn DocumentStore>, query: Query) -> Subscription {
    // Subscribe before the first snapshot so no write slips between them
    let changes = store.changes();
    Subscription {
        store,
        query,
        changes,
        primed: false,
    }
}
