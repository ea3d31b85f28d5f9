//! Configuration management for Siphon.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Siphon uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SIPHON_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation that names the offending field
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry run
//! - [`SourceConfig`] - Source URI, database, collection, field, filter
//! - [`TargetConfig`] - Target URI, database, collection, field, document id, write flags
//! - [`AggregationConfig`] - Disk use and batch size
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! uri = "mongodb://127.0.0.1:27017"
//! db = "crystal"
//! collection = "users"
//! field = "_id"
//! filter = { createdAt = { "$gte" = { "$date" = "2025-08-20T01:26:11.327Z" } } }
//!
//! [target]
//! uri = "${SIPHON_TARGET_URI}"
//! db = "pool"
//! collection = "usersIdFromCrystal"
//! field = "usersId"
//! document_id = "68a8c8207090be6dd0e23a90"
//! rewrite_documents = false
//! rewrite_array = false
//! duplicates_in_array = false
//! unwrap_object_id = true
//!
//! [aggregation]
//! allow_disk_use = true
//! batch_size = 1000
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    AggregationConfig, ApplicationConfig, DocumentIdSetting, LoggingConfig, SiphonConfig,
    SourceConfig, TargetConfig,
};
pub use secret::{redact_uri, secret_string, SecretString, SecretValue};
