//! Domain error types
//!
//! This module defines the error hierarchy for Siphon.
//! Errors are domain-specific and don't expose third-party driver types.

use thiserror::Error;

/// Main Siphon error type
///
/// This is the primary error type used throughout the application.
/// Every fatal kind aborts a transfer run; only [`SiphonError::Normalization`]
/// is ever recovered locally.
#[derive(Debug, Error)]
pub enum SiphonError {
    /// Missing or invalid settings, raised before any connection is opened
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source or target store unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure while clearing, reading, or writing a store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed identifier-like value during conversion
    #[error("Normalization error: {0}")]
    Normalization(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SiphonError {
    /// Process exit code for this error kind
    ///
    /// 2 = configuration, 4 = connection, 5 = any other fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SiphonError::Configuration(_) => 2,
            SiphonError::Connection(_) => 4,
            _ => 5,
        }
    }

    /// Whether the error is fatal for a transfer run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SiphonError::Normalization(_))
    }
}

/// Store operation errors
///
/// Errors raised by a store collaborator while the pipeline is running.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Clearing the target collection failed
    #[error("Failed to clear collection {namespace}: {message}")]
    ClearFailed { namespace: String, message: String },

    /// Opening the projection aggregate failed
    #[error("Failed to run aggregate on {namespace}: {message}")]
    AggregateFailed { namespace: String, message: String },

    /// Reading the next document from an open cursor failed
    #[error("Cursor failed on {namespace}: {message}")]
    CursorFailed { namespace: String, message: String },

    /// Inserting a new array document failed
    #[error("Failed to insert document into {namespace}: {message}")]
    InsertFailed { namespace: String, message: String },

    /// Updating (or upserting) the merge target failed
    #[error("Failed to update document {document_id} in {namespace}: {message}")]
    UpdateFailed {
        namespace: String,
        document_id: String,
        message: String,
    },

    /// The source filter could not be converted into a query document
    #[error("Invalid source filter: {0}")]
    InvalidFilter(String),
}

impl From<std::io::Error> for SiphonError {
    fn from(err: std::io::Error) -> Self {
        SiphonError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SiphonError {
    fn from(err: serde_json::Error) -> Self {
        SiphonError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SiphonError {
    fn from(err: toml::de::Error) -> Self {
        SiphonError::Configuration(format!("TOML parse error: {err}"))
    }
}
