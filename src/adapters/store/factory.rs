//! Store connector factory
//!
//! Picks the store implementation from the connection URI scheme.

use crate::adapters::mongodb::MongoConnector;
use crate::adapters::store::traits::StoreConnector;
use crate::config::redact_uri;
use crate::domain::{Result, SiphonError};
use std::sync::Arc;

/// URI schemes served by the MongoDB driver
const MONGODB_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];

/// Create a store connector for `uri`
///
/// # Errors
///
/// Returns [`SiphonError::Configuration`] for an unsupported scheme.
pub fn create_connector(uri: &str) -> Result<Arc<dyn StoreConnector>> {
    if MONGODB_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
        tracing::debug!(uri = %redact_uri(uri), "Using MongoDB connector");
        return Ok(Arc::new(MongoConnector::new()));
    }

    Err(SiphonError::Configuration(format!(
        "Unsupported store URI '{}'. Expected one of: {}",
        redact_uri(uri),
        MONGODB_SCHEMES.join(", ")
    )))
}
