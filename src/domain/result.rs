//! Result type alias for Siphon

use super::errors::SiphonError;

/// Result type alias for Siphon operations
///
/// # Examples
///
/// ```
/// use siphon::domain::result::Result;
/// use siphon::domain::errors::SiphonError;
///
/// fn failing_function() -> Result<()> {
///     Err(SiphonError::Configuration("batch_size must be > 0".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SiphonError>;
