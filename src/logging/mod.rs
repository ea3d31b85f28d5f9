//! Logging
//!
//! Structured logging on top of `tracing`:
//! - Console output, always on
//! - Optional JSON file output with daily or hourly rotation
//! - Level from configuration, `--log-level`, or `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use siphon::logging::init_logging;
//! use siphon::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a transfer
///
/// # Example
///
/// ```no_run
/// use siphon::log_transfer_start;
///
/// log_transfer_start!("crystal.users", "_id", "pool.ids", "insert", 1000);
/// ```
#[macro_export]
macro_rules! log_transfer_start {
    ($source:expr, $field:expr, $target:expr, $action:expr, $batch_size:expr) => {
        tracing::info!(
            source = %$source,
            field = %$field,
            target = %$target,
            action = %$action,
            batch_size = $batch_size,
            "Starting transfer"
        );
    };
}

/// Log a flushed batch
///
/// # Example
///
/// ```no_run
/// use siphon::log_batch_flushed;
///
/// log_batch_flushed!(1000, 5000, 5);
/// ```
#[macro_export]
macro_rules! log_batch_flushed {
    ($batch_len:expr, $total_collected:expr, $docs_written:expr) => {
        tracing::debug!(
            batch_len = $batch_len,
            total_collected = $total_collected,
            docs_written = $docs_written,
            "Batch flushed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use siphon::log_error_with_context;
/// use siphon::domain::SiphonError;
///
/// let error = SiphonError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
