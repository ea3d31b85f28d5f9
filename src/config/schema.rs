//! Configuration schema types
//!
//! This module defines the configuration structure for Siphon. Everything is
//! validated once at startup; the pipeline receives an immutable, already
//! valid [`SiphonConfig`].

use crate::config::SecretString;
use crate::domain::ids::TargetDocumentId;
use serde::{Deserialize, Serialize};

/// Main Siphon configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiphonConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Where values are read from
    pub source: SourceConfig,

    /// Where batches are written to, and how
    pub target: TargetConfig,

    /// Cursor and batch sizing
    pub aggregation: AggregationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SiphonConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.target.validate()?;
        self.aggregation.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (stream the source, skip every target write)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid application.log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Source collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Connection URI (may embed credentials)
    pub uri: SecretString,

    /// Database name
    pub db: String,

    /// Collection name
    pub collection: String,

    /// Field to extract; dotted paths reach into embedded documents
    pub field: String,

    /// Match filter, interpreted as MongoDB extended JSON (empty = all documents)
    #[serde(default, alias = "match")]
    pub filter: serde_json::Map<String, serde_json::Value>,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        validate_uri("source.uri", &self.uri)?;
        validate_name("source.db", &self.db)?;
        validate_name("source.collection", &self.collection)?;
        validate_field("source.field", &self.field)?;
        Ok(())
    }
}

/// `target.document_id` as written in the file: `false`, an integer or an id string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentIdSetting {
    /// `false` = always create a new document
    Flag(bool),
    /// Integer `_id` of the merge target
    Number(i64),
    /// Identifier of the merge target
    Id(String),
}

/// Target collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Connection URI (may embed credentials)
    pub uri: SecretString,

    /// Database name
    pub db: String,

    /// Collection name
    pub collection: String,

    /// Destination array field
    pub field: String,

    /// Merge target document, `false` or omitted to always insert new documents
    #[serde(default)]
    pub document_id: Option<DocumentIdSetting>,

    /// Clear the whole target collection before writing
    pub rewrite_documents: bool,

    /// On the merge path, replace the destination array instead of appending
    pub rewrite_array: bool,

    /// On append, allow repeated entries (`false` = set-union)
    pub duplicates_in_array: bool,

    /// Store identifier values as their 24-character hex string
    #[serde(default)]
    pub unwrap_object_id: bool,
}

impl TargetConfig {
    fn validate(&self) -> Result<(), String> {
        validate_uri("target.uri", &self.uri)?;
        validate_name("target.db", &self.db)?;
        validate_name("target.collection", &self.collection)?;
        validate_field("target.field", &self.field)?;

        if self.field == "_id" {
            return Err("target.field cannot be '_id'".to_string());
        }

        match &self.document_id {
            Some(DocumentIdSetting::Flag(true)) => Err(
                "target.document_id must be false, an integer or an identifier string, got true"
                    .to_string(),
            ),
            Some(DocumentIdSetting::Id(id)) if id.trim().is_empty() => {
                Err("target.document_id cannot be an empty string".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Configured document id, if one was given
    pub fn document_id(&self) -> Option<TargetDocumentId> {
        match &self.document_id {
            Some(DocumentIdSetting::Id(id)) => Some(TargetDocumentId::parse(id)),
            Some(DocumentIdSetting::Number(n)) => Some(TargetDocumentId::Int(*n)),
            _ => None,
        }
    }

    /// Merge target actually used by the write policy
    ///
    /// `rewrite_documents` disables the identifier path: every flush inserts a
    /// new document into the freshly cleared collection.
    pub fn merge_target(&self) -> Option<TargetDocumentId> {
        if self.rewrite_documents {
            None
        } else {
            self.document_id()
        }
    }
}

/// Aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Allow the server to spill aggregation stages to disk
    pub allow_disk_use: bool,

    /// Cursor batch size and maximum array length per written batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl AggregationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("aggregation.batch_size must be > 0".to_string());
        }
        if self.batch_size > u32::MAX as usize {
            return Err(format!(
                "aggregation.batch_size must be <= {}, got {}",
                u32::MAX,
                self.batch_size
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_uri(name: &str, uri: &SecretString) -> Result<(), String> {
    use secrecy::ExposeSecret;

    let uri = uri.expose_secret();
    if uri.is_empty() {
        return Err(format!("{name} cannot be empty"));
    }
    if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
        return Err(format!(
            "{name} must start with mongodb:// or mongodb+srv://"
        ));
    }
    Ok(())
}

fn validate_name(name: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{name} cannot be empty"));
    }
    Ok(())
}

fn validate_field(name: &str, value: &str) -> Result<(), String> {
    validate_name(name, value)?;
    if value.starts_with('$') {
        return Err(format!("{name} cannot start with '$', got '{value}'"));
    }
    if value.split('.').any(str::is_empty) {
        return Err(format!("{name} has an empty path segment: '{value}'"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
