use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::debug;

use fundcrm_core::EntityId;
use fundcrm_query::{Filter, SortSpec};

use crate::transaction::{ReadConcern, Session, SessionSource, StorageError, TransactionOptions};

#[derive(Debug, Default, Clone)]
struct Collection {
    version: u64,
    docs: Vec<Value>,
}

type Database = HashMap<String, Collection>;

fn poisoned() -> StorageError {
    StorageError::Backend("lock poisoned".to_string())
}

fn select(docs: &[Value], filter: Option<&Filter>, sort: Option<&SortSpec>) -> Vec<Value> {
    let mut out: Vec<Value> = docs
        .iter()
        .filter(|d| filter.is_none_or(|f| f.matches(d)))
        .cloned()
        .collect();
    if let Some(spec) = sort {
        spec.sort(&mut out);
    }
    out
}

fn prepare_insert(mut doc: Value) -> Result<(EntityId, Value), StorageError> {
    let Value::Object(fields) = &mut doc else {
        return Err(StorageError::Backend("documents must be JSON objects".to_string()));
    };
    let id = match fields.get("_id") {
        Some(Value::String(raw)) => raw
            .parse()
            .map_err(|_| StorageError::Backend(format!("malformed _id '{raw}'")))?,
        Some(other) => return Err(StorageError::Backend(format!("malformed _id {other}"))),
        None => {
            let id = EntityId::new();
            fields.insert("_id".to_string(), Value::String(id.to_string()));
            id
        }
    };
    Ok((id, doc))
}

/// In-memory document store with snapshot-isolated transactions.
///
/// Committed state is an immutable `Arc<Database>` that is swapped on commit.
/// A transaction reads from the snapshot it started with and stages writes on
/// private copies of the touched collections. Commit fails with
/// [`StorageError::Transient`] if another transaction committed to one of
/// those collections in the meantime.
///
/// Intended for tests/dev.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    committed: Arc<RwLock<Arc<Database>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Result<Arc<Database>, StorageError> {
        let guard = self.committed.read().map_err(|_| poisoned())?;
        Ok(Arc::clone(&guard))
    }

    /// Read committed documents outside of any transaction.
    pub fn find(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Value>, StorageError> {
        let db = self.current()?;
        Ok(db
            .get(collection)
            .map(|c| select(&c.docs, filter, sort))
            .unwrap_or_default())
    }

    pub fn find_by_id(&self, collection: &str, id: EntityId) -> Result<Option<Value>, StorageError> {
        let filter = Filter::eq("_id", id.to_string());
        Ok(self.find(collection, Some(&filter), None)?.into_iter().next())
    }

    /// Auto-committed single insert. Used for seeding.
    pub fn insert_one(&self, collection: &str, doc: Value) -> Result<EntityId, StorageError> {
        let (id, doc) = prepare_insert(doc)?;
        let mut guard = self.committed.write().map_err(|_| poisoned())?;
        let mut next = Database::clone(&guard);
        let coll = next.entry(collection.to_string()).or_default();
        coll.version += 1;
        coll.docs.push(doc);
        *guard = Arc::new(next);
        Ok(id)
    }

    pub fn session(&self) -> InMemorySession {
        InMemorySession {
            committed: Arc::clone(&self.committed),
            txn: None,
        }
    }
}

#[async_trait::async_trait]
impl SessionSource for InMemoryDocumentStore {
    type Session = InMemorySession;

    async fn start_session(&self) -> Result<InMemorySession, StorageError> {
        Ok(self.session())
    }
}

#[derive(Debug)]
struct ActiveTxn {
    snapshot: Arc<Database>,
    staged: HashMap<String, Collection>,
}

impl ActiveTxn {
    fn view(&self, collection: &str) -> Option<&Collection> {
        self.staged.get(collection).or_else(|| self.snapshot.get(collection))
    }

    fn stage(&mut self, collection: &str) -> &mut Collection {
        let snapshot = &self.snapshot;
        self.staged
            .entry(collection.to_string())
            .or_insert_with(|| snapshot.get(collection).cloned().unwrap_or_default())
    }
}

/// Session over an [`InMemoryDocumentStore`].
#[derive(Debug)]
pub struct InMemorySession {
    committed: Arc<RwLock<Arc<Database>>>,
    txn: Option<ActiveTxn>,
}

impl InMemorySession {
    fn active(&self) -> Result<&ActiveTxn, StorageError> {
        self.txn.as_ref().ok_or(StorageError::NoActiveTransaction)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveTxn, StorageError> {
        self.txn.as_mut().ok_or(StorageError::NoActiveTransaction)
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub fn find(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Value>, StorageError> {
        let txn = self.active()?;
        Ok(txn
            .view(collection)
            .map(|c| select(&c.docs, filter, sort))
            .unwrap_or_default())
    }

    pub fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StorageError> {
        let txn = self.active()?;
        Ok(txn
            .view(collection)
            .and_then(|c| c.docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    /// Insert `doc`, assigning an `_id` when absent.
    pub fn insert_one(&mut self, collection: &str, doc: Value) -> Result<EntityId, StorageError> {
        let (id, doc) = prepare_insert(doc)?;
        self.active_mut()?.stage(collection).docs.push(doc);
        Ok(id)
    }

    /// Overwrite top-level fields on every matching document.
    pub fn update_many(&mut self, collection: &str, filter: &Filter, set: &Map<String, Value>) -> Result<u64, StorageError> {
        let coll = self.active_mut()?.stage(collection);
        let mut modified = 0;
        for doc in coll.docs.iter_mut().filter(|d| filter.matches(d)) {
            if let Value::Object(fields) = doc {
                for (k, v) in set {
                    fields.insert(k.clone(), v.clone());
                }
                modified += 1;
            }
        }
        Ok(modified)
    }

    /// Add `delta` to an integer field on every matching document.
    pub fn increment(&mut self, collection: &str, filter: &Filter, field: &str, delta: i64) -> Result<u64, StorageError> {
        let coll = self.active_mut()?.stage(collection);
        let mut modified = 0;
        for doc in coll.docs.iter_mut().filter(|d| filter.matches(d)) {
            if let Value::Object(fields) = doc {
                let current = match fields.get(field) {
                    None | Some(Value::Null) => 0,
                    Some(v) => v
                        .as_i64()
                        .ok_or_else(|| StorageError::Backend(format!("field '{field}' is not an integer")))?,
                };
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| StorageError::Backend(format!("field '{field}' overflowed")))?;
                fields.insert(field.to_string(), Value::from(next));
                modified += 1;
            }
        }
        Ok(modified)
    }
}

#[async_trait::async_trait]
impl Session for InMemorySession {
    fn start_transaction(&mut self, options: &TransactionOptions) -> Result<(), StorageError> {
        if options.read_concern != ReadConcern::Snapshot {
            return Err(StorageError::Backend(format!(
                "in-memory store only supports snapshot reads, got {:?}",
                options.read_concern
            )));
        }
        if self.txn.is_some() {
            return Err(StorageError::Backend("transaction already in progress".to_string()));
        }
        let snapshot = {
            let guard = self.committed.read().map_err(|_| poisoned())?;
            Arc::clone(&guard)
        };
        self.txn = Some(ActiveTxn {
            snapshot,
            staged: HashMap::new(),
        });
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), StorageError> {
        let txn = self.active()?;
        if txn.staged.is_empty() {
            self.txn = None;
            return Ok(());
        }

        {
            let mut guard = self.committed.write().map_err(|_| poisoned())?;
            for name in txn.staged.keys() {
                let seen = txn.snapshot.get(name).map(|c| c.version).unwrap_or(0);
                let now = guard.get(name).map(|c| c.version).unwrap_or(0);
                if seen != now {
                    return Err(StorageError::Transient(format!("write conflict on collection '{name}'")));
                }
            }

            let mut next = Database::clone(&guard);
            for (name, staged) in &txn.staged {
                let mut coll = staged.clone();
                coll.version += 1;
                next.insert(name.clone(), coll);
            }
            *guard = Arc::new(next);
        }

        debug!(collections = txn.staged.len(), "in-memory transaction committed");
        self.txn = None;
        Ok(())
    }

    async fn abort_transaction(&mut self) -> Result<(), StorageError> {
        self.txn = None;
        Ok(())
    }

    async fn end_session(&mut self) {
        self.txn = None;
    }
}
