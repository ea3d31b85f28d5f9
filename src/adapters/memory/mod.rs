//! In-memory document store
//!
//! A deterministic [`StoreConnector`] backed by a shared map of collections.
//! It records every operation and every `close` so tests can assert ordering,
//! write counts, and connection release, and it can be told to refuse
//! connections or fail writes.
//!
//! Filters support top-level and dotted-path equality only. Numbers compare
//! by value across `Int32`, `Int64` and `Double`, as the server does for
//! `_id` lookups and `$addToSet`.
//!
//! ```rust
//! use siphon::adapters::memory::MemoryStore;
//! use siphon::adapters::store::Namespace;
//! use bson::doc;
//!
//! let store = MemoryStore::new();
//! let users = Namespace::new("crystal", "users");
//! store.seed(&users, vec![doc! { "_id": 1, "email": "a@example.com" }]);
//! assert_eq!(store.documents(&users).len(), 1);
//! ```

use crate::adapters::store::traits::{
    Namespace, ProjectionQuery, StoreConnection, StoreConnector, ValueStream,
};
use crate::domain::ids::TargetDocumentId;
use crate::domain::value::FieldValue;
use crate::domain::{Result, SiphonError, StoreError};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation recorded by the memory store, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    /// Projection aggregate opened
    Aggregate { namespace: Namespace },
    /// Collection cleared
    Clear { namespace: Namespace, removed: u64 },
    /// New array document inserted
    Insert { namespace: Namespace, len: usize },
    /// Destination array replaced on the merge target
    UpsertSet { namespace: Namespace, id: TargetDocumentId, len: usize },
    /// Values appended to the merge target
    UpsertAppend {
        namespace: Namespace,
        id: TargetDocumentId,
        len: usize,
        allow_duplicates: bool,
    },
}

impl StoreOperation {
    /// Whether the operation modified a collection
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreOperation::Aggregate { .. })
    }
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<Namespace, Vec<Document>>,
    unreachable: HashSet<String>,
    writes_before_failure: Option<usize>,
    fail_clear: bool,
    operations: Vec<StoreOperation>,
    connections_opened: usize,
    connections_closed: usize,
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append documents to a collection
    pub fn seed(&self, namespace: &Namespace, documents: Vec<Document>) {
        self.lock()
            .collections
            .entry(namespace.clone())
            .or_default()
            .extend(documents);
    }

    /// Seed one document per value as `{ _id: n, field: value }`
    pub fn seed_values(
        &self,
        namespace: &Namespace,
        field: &str,
        values: impl IntoIterator<Item = Bson>,
    ) {
        let documents = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let mut document = Document::new();
                document.insert("_id", i as i64);
                document.insert(field, value);
                document
            })
            .collect();
        self.seed(namespace, documents);
    }

    /// Snapshot of a collection
    pub fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        self.lock()
            .collections
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Refuse connections to `uri`
    pub fn set_unreachable(&self, uri: impl Into<String>) {
        self.lock().unreachable.insert(uri.into());
    }

    /// Let `count` writes succeed, then fail every later write
    pub fn fail_writes_after(&self, count: usize) {
        self.lock().writes_before_failure = Some(count);
    }

    /// Make `clear_collection` fail
    pub fn fail_clear(&self) {
        self.lock().fail_clear = true;
    }

    /// All recorded operations, in call order
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    /// Number of successful connects
    pub fn connections_opened(&self) -> usize {
        self.lock().connections_opened
    }

    /// Number of connections released
    pub fn connections_closed(&self) -> usize {
        self.lock().connections_closed
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self, uri: &str) -> Result<Box<dyn StoreConnection>> {
        let mut state = self.lock();
        if state.unreachable.contains(uri) {
            return Err(SiphonError::Connection(format!("{uri} is unreachable")));
        }
        state.connections_opened += 1;
        drop(state);

        Ok(Box::new(MemoryConnection {
            store: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Connection handle onto a [`MemoryStore`]
pub struct MemoryConnection {
    store: MemoryStore,
    closed: AtomicBool,
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Equality the way the server compares values
fn same_value(left: &Bson, right: &Bson) -> bool {
    match (left, right) {
        (Bson::Int64(a), Bson::Int64(b)) => a == b,
        (Bson::Int32(a), Bson::Int64(b)) | (Bson::Int64(b), Bson::Int32(a)) => {
            i64::from(*a) == *b
        }
        _ => match (numeric(left), numeric(right)) {
            (Some(a), Some(b)) => a == b,
            _ => left == right,
        },
    }
}

fn equality_filter(query: &ProjectionQuery) -> Result<Vec<(String, Bson)>> {
    query
        .filter
        .iter()
        .map(|(key, value)| {
            let bson = Bson::try_from(value.clone())
                .map_err(|e| StoreError::InvalidFilter(e.to_string()))?;
            let has_operator = key.starts_with('$')
                || matches!(&bson, Bson::Document(d) if d.keys().any(|k| k.starts_with('$')));
            if has_operator {
                return Err(StoreError::InvalidFilter(format!(
                    "memory store supports equality filters only, got operator on '{key}'"
                ))
                .into());
            }
            Ok((key.clone(), bson))
        })
        .collect()
}

impl MemoryConnection {
    /// Check the write budget and record the operation
    fn record_write(state: &mut MemoryState, operation: StoreOperation) -> Result<()> {
        if let Some(remaining) = state.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(match operation {
                    StoreOperation::Insert { namespace, .. } => StoreError::InsertFailed {
                        namespace: namespace.to_string(),
                        message: "injected write failure".to_string(),
                    },
                    StoreOperation::UpsertSet { namespace, id, .. }
                    | StoreOperation::UpsertAppend { namespace, id, .. } => {
                        StoreError::UpdateFailed {
                            namespace: namespace.to_string(),
                            document_id: id.to_string(),
                            message: "injected write failure".to_string(),
                        }
                    }
                    other => StoreError::InsertFailed {
                        namespace: String::new(),
                        message: format!("injected write failure on {other:?}"),
                    },
                }
                .into());
            }
            *remaining -= 1;
        }
        state.operations.push(operation);
        Ok(())
    }

    /// Find or create the merge target, returning its index
    fn target_index(documents: &mut Vec<Document>, id: &TargetDocumentId) -> usize {
        let id = id.to_bson();
        if let Some(index) = documents
            .iter()
            .position(|d| d.get("_id").is_some_and(|v| same_value(v, &id))) {
            return index;
        }
        let mut document = Document::new();
        document.insert("_id", id);
        documents.push(document);
        documents.len() - 1
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn run_projection_aggregate(&self, query: &ProjectionQuery) -> Result<ValueStream> {
        let filter = equality_filter(query)?;
        let mut state = self.store.lock();
        state.operations.push(StoreOperation::Aggregate {
            namespace: query.namespace.clone(),
        });

        let values: Vec<Result<FieldValue>> = state
            .collections
            .get(&query.namespace)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| filter.iter().all(|(k, v)| lookup(d, k) == Some(v)))
                    .map(|d| Ok(FieldValue::from(lookup(d, &query.field).cloned())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(stream::iter(values).boxed())
    }

    async fn clear_collection(&self, namespace: &Namespace) -> Result<u64> {
        let mut state = self.store.lock();
        if state.fail_clear {
            return Err(StoreError::ClearFailed {
                namespace: namespace.to_string(),
                message: "injected clear failure".to_string(),
            }
            .into());
        }
        let removed = state
            .collections
            .get_mut(namespace)
            .map(|documents| std::mem::take(documents).len() as u64)
            .unwrap_or(0);
        state.operations.push(StoreOperation::Clear {
            namespace: namespace.clone(),
            removed,
        });
        Ok(removed)
    }

    async fn insert_document(
        &self,
        namespace: &Namespace,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()> {
        let mut state = self.store.lock();
        Self::record_write(
            &mut state,
            StoreOperation::Insert {
                namespace: namespace.clone(),
                len: values.len(),
            },
        )?;

        let mut document = Document::new();
        document.insert("_id", ObjectId::new());
        document.insert(field, Bson::from(FieldValue::Sequence(values)));
        state
            .collections
            .entry(namespace.clone())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn upsert_set(
        &self,
        namespace: &Namespace,
        id: &TargetDocumentId,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()> {
        let mut state = self.store.lock();
        Self::record_write(
            &mut state,
            StoreOperation::UpsertSet {
                namespace: namespace.clone(),
                id: id.clone(),
                len: values.len(),
            },
        )?;

        let documents = state.collections.entry(namespace.clone()).or_default();
        let index = Self::target_index(documents, id);
        documents[index].insert(field, Bson::from(FieldValue::Sequence(values)));
        Ok(())
    }

    async fn upsert_append(
        &self,
        namespace: &Namespace,
        id: &TargetDocumentId,
        field: &str,
        values: Vec<FieldValue>,
        allow_duplicates: bool,
    ) -> Result<()> {
        let mut state = self.store.lock();
        Self::record_write(
            &mut state,
            StoreOperation::UpsertAppend {
                namespace: namespace.clone(),
                id: id.clone(),
                len: values.len(),
                allow_duplicates,
            },
        )?;

        let documents = state.collections.entry(namespace.clone()).or_default();
        let index = Self::target_index(documents, id);
        let document = &mut documents[index];

        let mut array = match document.remove(field) {
            None => Vec::new(),
            Some(Bson::Array(existing)) => existing,
            Some(other) => {
                document.insert(field, other);
                return Err(StoreError::UpdateFailed {
                    namespace: namespace.to_string(),
                    document_id: id.to_string(),
                    message: format!("field '{field}' is not an array"),
                }
                .into());
            }
        };

        for value in values.into_iter().map(Bson::from) {
            if allow_duplicates || !array.iter().any(|existing| same_value(existing, &value)) {
                array.push(value);
            }
        }
        document.insert(field, Bson::Array(array));
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.lock().connections_closed += 1;
        }
    }
}
