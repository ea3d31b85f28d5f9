//! Value normalization
//!
//! Turns one projected [`FieldValue`] into the form that is stored, or `None`
//! when there is nothing to store. Pure; no I/O, no logging.
//!
//! | input | result |
//! |---|---|
//! | `Empty` | `None` |
//! | `Identifier` | hex string if unwrapping, else unchanged |
//! | `Sequence` | empty elements dropped, identifier rule applied per element; `None` if nothing remains |
//! | `Scalar` | unchanged |

use crate::domain::value::FieldValue;
use bson::Bson;

/// Normalize a projected value
///
/// Returns `None` for values that must not be collected.
///
/// # Examples
///
/// ```
/// use siphon::core::normalize::normalize;
/// use siphon::domain::FieldValue;
/// use bson::oid::ObjectId;
///
/// let oid = ObjectId::parse_str("68a8c8207090be6dd0e23a90").unwrap();
/// assert_eq!(
///     normalize(FieldValue::Identifier(oid), true),
///     Some(FieldValue::string("68a8c8207090be6dd0e23a90"))
/// );
/// assert_eq!(normalize(FieldValue::Empty, true), None);
/// ```
pub fn normalize(value: FieldValue, unwrap_identifiers: bool) -> Option<FieldValue> {
    match value {
        FieldValue::Empty => None,
        FieldValue::Sequence(items) => {
            let inner: Vec<FieldValue> = items
                .into_iter()
                .filter(|item| !item.is_empty())
                .map(|item| normalize_element(item, unwrap_identifiers))
                .collect();
            if inner.is_empty() {
                None
            } else {
                Some(FieldValue::Sequence(inner))
            }
        }
        other => Some(normalize_element(other, unwrap_identifiers)),
    }
}

/// Apply the identifier rule to a single element
///
/// Nested sequences are returned unchanged; only one level is unwrapped.
pub fn normalize_element(value: FieldValue, unwrap_identifiers: bool) -> FieldValue {
    match value {
        FieldValue::Identifier(oid) if unwrap_identifiers => {
            FieldValue::Scalar(Bson::String(oid.to_hex()))
        }
        other => other,
    }
}
