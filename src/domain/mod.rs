//! Domain models and types for Siphon.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Field values** ([`FieldValue`]) - the closed set of shapes a projected value can take
//! - **Target identifiers** ([`TargetDocumentId`]) - `_id` of the merge target document
//! - **Error types** ([`SiphonError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SiphonError>`]:
//!
//! ```rust,no_run
//! use siphon::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = siphon::config::load_config("siphon.toml")?;
//!     println!("batch size: {}", config.aggregation.batch_size);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod result;
pub mod value;

pub use errors::{SiphonError, StoreError};
pub use ids::TargetDocumentId;
pub use result::Result;
pub use value::FieldValue;
