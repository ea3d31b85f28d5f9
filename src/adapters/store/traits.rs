//! Document store abstraction traits
//!
//! This module defines the interface the transfer pipeline calls. Store
//! adapters (MongoDB, in-memory) implement it; the pipeline never touches a
//! driver type directly.

use crate::domain::ids::TargetDocumentId;
use crate::domain::value::FieldValue;
use crate::domain::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

/// Database + collection pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Database name
    pub db: String,
    /// Collection name
    pub collection: String,
}

impl Namespace {
    /// Creates a namespace
    pub fn new(db: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.collection)
    }
}

/// Cursor options for the projection aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Allow the server to use temporary disk space
    pub allow_disk_use: bool,
    /// Documents per cursor round trip
    pub batch_size: u32,
}

/// Projection request: which field to pull out of which documents
#[derive(Debug, Clone)]
pub struct ProjectionQuery {
    /// Source namespace
    pub namespace: Namespace,
    /// Match filter in extended JSON (empty = all documents)
    pub filter: serde_json::Map<String, serde_json::Value>,
    /// Field path to project
    pub field: String,
    /// Cursor options
    pub options: AggregationOptions,
}

/// Finite, forward-only, non-restartable stream of projected values
pub type ValueStream = BoxStream<'static, Result<FieldValue>>;

/// Opens connections to a store
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect to the store at `uri`
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::SiphonError::Connection`] if the store is unreachable.
    async fn connect(&self, uri: &str) -> Result<Box<dyn StoreConnection>>;
}

/// An open store connection
///
/// Every write method is awaited to completion by the caller before the next
/// source read, so implementations never see concurrent calls from one run.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Run `$match` + `$project` and stream the projected value of every matched document
    ///
    /// A document without the field yields [`FieldValue::Empty`].
    async fn run_projection_aggregate(&self, query: &ProjectionQuery) -> Result<ValueStream>;

    /// Delete every document in the collection, returning the removed count
    async fn clear_collection(&self, namespace: &Namespace) -> Result<u64>;

    /// Insert a new document `{ field: values }`
    async fn insert_document(
        &self,
        namespace: &Namespace,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()>;

    /// Set `field` to `values` on document `id`, creating the document if missing
    async fn upsert_set(
        &self,
        namespace: &Namespace,
        id: &TargetDocumentId,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()>;

    /// Append `values` to the array `field` on document `id`, creating it if missing
    ///
    /// With `allow_duplicates == false` only values not already present
    /// (by value equality) are appended.
    async fn upsert_append(
        &self,
        namespace: &Namespace,
        id: &TargetDocumentId,
        field: &str,
        values: Vec<FieldValue>,
        allow_duplicates: bool,
    ) -> Result<()>;

    /// Release the connection. Idempotent and infallible.
    async fn close(&self);
}
