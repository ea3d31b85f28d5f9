//! MongoDB client implementation
//!
//! Implements the store traits on top of the official `mongodb` driver.

use crate::adapters::store::traits::{
    Namespace, ProjectionQuery, StoreConnection, StoreConnector, ValueStream,
};
use crate::config::redact_uri;
use crate::domain::ids::TargetDocumentId;
use crate::domain::value::FieldValue;
use crate::domain::{Result, SiphonError, StoreError};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::stream::StreamExt;
use ::mongodb::options::{AggregateOptions, UpdateOptions};
use ::mongodb::{Client, Collection};
use std::sync::atomic::{AtomicBool, Ordering};

/// Alias the projected field is exposed under in aggregate output
pub const PROJECTION_ALIAS: &str = "v";

/// Opens [`MongoConnection`]s
#[derive(Debug, Default, Clone)]
pub struct MongoConnector;

impl MongoConnector {
    /// Create a new connector
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self, uri: &str) -> Result<Box<dyn StoreConnection>> {
        let connection = MongoConnection::connect(uri).await?;
        Ok(Box::new(connection))
    }
}

/// Live connection to a MongoDB deployment
pub struct MongoConnection {
    client: Client,
    endpoint: String,
    closed: AtomicBool,
}

impl MongoConnection {
    /// Connect and verify reachability with a `ping`
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// server into a [`SiphonError::Connection`] here instead of a store error
    /// on the first read or write.
    pub async fn connect(uri: &str) -> Result<Self> {
        let endpoint = redact_uri(uri);

        let client = Client::with_uri_str(uri).await.map_err(|e| {
            SiphonError::Connection(format!("Failed to create client for {endpoint}: {e}"))
        })?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| SiphonError::Connection(format!("{endpoint} is unreachable: {e}")))?;

        tracing::debug!(endpoint = %endpoint, "Connected to MongoDB");

        Ok(Self {
            client,
            endpoint,
            closed: AtomicBool::new(false),
        })
    }

    /// Redacted endpoint for logging
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn collection(&self, namespace: &Namespace) -> Collection<Document> {
        self.client
            .database(&namespace.db)
            .collection::<Document>(&namespace.collection)
    }
}

/// Builds the `$match` + `$project` pipeline for a projection query
pub fn projection_pipeline(query: &ProjectionQuery) -> Result<Vec<Document>> {
    let filter = filter_document(&query.filter)?;
    Ok(vec![
        doc! { "$match": filter },
        doc! { "$project": { PROJECTION_ALIAS: format!("${}", query.field) } },
    ])
}

/// Converts an extended-JSON filter into a BSON document
pub fn filter_document(filter: &serde_json::Map<String, serde_json::Value>) -> Result<Document> {
    let value = serde_json::Value::Object(filter.clone());
    match Bson::try_from(value) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(StoreError::InvalidFilter(format!(
            "filter must be a document, got {other}"
        ))
        .into()),
        Err(e) => Err(StoreError::InvalidFilter(e.to_string()).into()),
    }
}

fn to_bson_array(values: Vec<FieldValue>) -> Bson {
    Bson::Array(values.into_iter().map(Bson::from).collect())
}

fn upsert_options() -> UpdateOptions {
    UpdateOptions::builder().upsert(true).build()
}

#[async_trait]
impl StoreConnection for MongoConnection {
    async fn run_projection_aggregate(&self, query: &ProjectionQuery) -> Result<ValueStream> {
        let pipeline = projection_pipeline(query)?;
        let options = AggregateOptions::builder()
            .allow_disk_use(query.options.allow_disk_use)
            .batch_size(query.options.batch_size)
            .build();

        let namespace = query.namespace.to_string();
        let cursor = self
            .collection(&query.namespace)
            .aggregate(pipeline, options)
            .await
            .map_err(|e| StoreError::AggregateFailed {
                namespace: namespace.clone(),
                message: e.to_string(),
            })?;

        let stream = cursor.map(move |item| match item {
            Ok(mut document) => Ok(FieldValue::from(document.remove(PROJECTION_ALIAS))),
            Err(e) => Err(StoreError::CursorFailed {
                namespace: namespace.clone(),
                message: e.to_string(),
            }
            .into()),
        });

        Ok(stream.boxed())
    }

    async fn clear_collection(&self, namespace: &Namespace) -> Result<u64> {
        let result = self
            .collection(namespace)
            .delete_many(doc! {}, None)
            .await
            .map_err(|e| StoreError::ClearFailed {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })?;
        Ok(result.deleted_count)
    }

    async fn insert_document(
        &self,
        namespace: &Namespace,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()> {
        let mut document = Document::new();
        document.insert(field, to_bson_array(values));

        self.collection(namespace)
            .insert_one(document, None)
            .await
            .map_err(|e| StoreError::InsertFailed {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn upsert_set(
        &self,
        namespace: &Namespace,
        id: &TargetDocumentId,
        field: &str,
        values: Vec<FieldValue>,
    ) -> Result<()> {
        let mut set = Document::new();
        set.insert(field, to_bson_array(values));

        self.collection(namespace)
            .update_one(doc! { "_id": id.to_bson() }, doc! { "$set": set }, upsert_options())
            .await
            .map_err(|e| StoreError::UpdateFailed {
                namespace: namespace.to_string(),
                document_id: id.to_string(),
                message: e.to_string(),
            })?;
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
        let operator = if allow_duplicates { "$push" } else { "$addToSet" };
        let mut each = Document::new();
        each.insert(field, doc! { "$each": to_bson_array(values) });
        let mut update = Document::new();
        update.insert(operator, each);

        self.collection(namespace)
            .update_one(doc! { "_id": id.to_bson() }, update, upsert_options())
            .await
            .map_err(|e| StoreError::UpdateFailed {
                namespace: namespace.to_string(),
                document_id: id.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.client.clone().shutdown().await;
        tracing::debug!(endpoint = %self.endpoint, "MongoDB connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::traits::AggregationOptions;
    use serde_json::json;

    fn query(filter: serde_json::Value) -> ProjectionQuery {
        ProjectionQuery {
            namespace: Namespace::new("crystal", "users"),
            filter: filter.as_object().cloned().unwrap_or_default(),
            field: "profile.email".to_string(),
            options: AggregationOptions {
                allow_disk_use: true,
                batch_size: 3,
            },
        }
    }

    #[test]
    fn test_projection_pipeline_shape() {
        let pipeline = projection_pipeline(&query(json!({}))).unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0], doc! { "$match": {} });
        assert_eq!(pipeline[1], doc! { "$project": { "v": "$profile.email" } });
    }

    #[test]
    fn test_filter_extended_json_date() {
        let filter = json!({ "createdAt": { "$gte": { "$date": "2025-08-20T01:26:11.327Z" } } });
        let document = filter_document(filter.as_object().unwrap()).unwrap();
        let gte = document
            .get_document("createdAt")
            .unwrap()
            .get("$gte")
            .unwrap();
        assert!(matches!(gte, Bson::DateTime(_)));
    }

    #[test]
    fn test_filter_plain_values() {
        let filter = json!({ "status": "active", "age": { "$gt": 21 } });
        let document = filter_document(filter.as_object().unwrap()).unwrap();
        assert_eq!(document.get_str("status").unwrap(), "active");
    }
}
