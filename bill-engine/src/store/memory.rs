//! In-memory document store

use super::{
    CHANGE_CHANNEL_CAPACITY, Document, DocumentStore, Query, StoreError, StoreResult, merge_patch,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;
use tracing::debug;

type Collection = BTreeMap<String, Value>;

/// Process-local document store
///
/// Documents live in a map per collection. Every committed write publishes
/// the collection name on a broadcast channel for subscriptions.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine
        let _ = self.changes.send(collection.to_string());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String> {
        if !data.is_object() {
            return Err(StoreError::InvalidPatch("document must be a JSON object".into()));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        debug!(collection, id = %id, "Document created");
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        if !data.is_object() {
            return Err(StoreError::InvalidPatch("document must be a JSON object".into()));
        }
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        {
            let mut collections = self.collections.write();
            let doc = collections
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            merge_patch(doc, patch)?;
        }
        debug!(collection, id, "Document updated");
        self.notify(collection);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let docs: Vec<Document> = self
            .collections
            .read()
            .get(&query.collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
