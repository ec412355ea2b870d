//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(collection, id)` | JSON bytes | every document of every collection |
//!
//! Composite keys keep a collection contiguous, so a query is one range
//! scan over `(collection, "")..` followed by in-memory filtering.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns the write survives power loss.

use super::{
    CHANGE_CHANNEL_CAPACITY, Document, DocumentStore, Query, StoreError, StoreResult, merge_patch,
};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// key = (collection, document id), value = JSON-serialized document
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

/// Durable document store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    changes: broadcast::Sender<String>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path)?;
        info!(path = %path.display(), "Document store opened");
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            changes,
        })
    }

    fn put(&self, collection: &str, id: &str, data: &Value) -> StoreResult<()> {
        if !data.is_object() {
            return Err(StoreError::InvalidPatch("document must be a JSON object".into()));
        }
        let bytes = serde_json::to_vec(data)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            table.insert((collection, id), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn notify(&self, collection: &str) {
        let _ = self.changes.send(collection.to_string());
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn create(&self, collection: &str, data: Value) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.put(collection, &id, &data)?;
        debug!(collection, id = %id, "Document created");
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.put(collection, id, &data)?;
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            let mut doc: Value = match table.get((collection, id))? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => {
                    return Err(StoreError::NotFound {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                }
            };
            merge_patch(&mut doc, patch)?;
            let bytes = serde_json::to_vec(&doc)?;
            table.insert((collection, id), bytes.as_slice())?;
        }
        txn.commit()?;
        debug!(collection, id, "Document updated");
        self.notify(collection);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((collection, id))? {
            Some(guard) => Ok(Some(Document {
                id: id.to_string(),
                data: serde_json::from_slice(guard.value())?,
            })),
            None => Ok(None),
        }
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut docs = Vec::new();
        for result in table.range((query.collection.as_str(), "")..)? {
            let (key, value) = result?;
            let (collection, id) = key.value();
            if collection != query.collection {
                break;
            }
            let data: Value = serde_json::from_slice(value.value())?;
            if query.matches(&data) {
                docs.push(Document {
                    id: id.to_string(),
                    data,
                });
            }
        }
        Ok(query.apply(docs))
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
