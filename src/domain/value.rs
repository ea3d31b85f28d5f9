//! Projected field values
//!
//! A value read from the source cursor is classified once into a
//! [`FieldValue`] so that normalization is a total function over a closed set
//! of variants instead of runtime type inspection.

use bson::oid::ObjectId;
use bson::Bson;
use std::fmt;

/// A single projected field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Null, undefined, or missing field
    Empty,

    /// Store-native identifier (12 bytes, rendered as 24 hex characters)
    Identifier(ObjectId),

    /// Any other non-array value (strings, numbers, dates, embedded documents, ...)
    Scalar(Bson),

    /// Array value; elements are classified recursively
    Sequence(Vec<FieldValue>),
}

impl FieldValue {
    /// Returns true for the `Empty` variant
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Convenience constructor for a string scalar
    pub fn string(value: impl Into<String>) -> Self {
        FieldValue::Scalar(Bson::String(value.into()))
    }

    /// Returns the hex form if this is an identifier
    pub fn identifier_hex(&self) -> Option<String> {
        match self {
            FieldValue::Identifier(oid) => Some(oid.to_hex()),
            _ => None,
        }
    }

    /// Converts into the BSON representation written to the target store
    pub fn into_bson(self) -> Bson {
        self.into()
    }
}

impl From<Bson> for FieldValue {
    fn from(value: Bson) -> Self {
        match value {
            Bson::Null | Bson::Undefined => FieldValue::Empty,
            Bson::ObjectId(oid) => FieldValue::Identifier(oid),
            Bson::Array(items) => {
                FieldValue::Sequence(items.into_iter().map(FieldValue::from).collect())
            }
            other => FieldValue::Scalar(other),
        }
    }
}

impl From<Option<Bson>> for FieldValue {
    fn from(value: Option<Bson>) -> Self {
        value.map(FieldValue::from).unwrap_or(FieldValue::Empty)
    }
}

impl From<FieldValue> for Bson {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Empty => Bson::Null,
            FieldValue::Identifier(oid) => Bson::ObjectId(oid),
            FieldValue::Scalar(b) => b,
            FieldValue::Sequence(items) => Bson::Array(items.into_iter().map(Bson::from).collect()),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Scalar(Bson::Int32(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(Bson::Int64(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::string(value)
    }
}

impl From<ObjectId> for FieldValue {
    fn from(value: ObjectId) -> Self {
        FieldValue::Identifier(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => write!(f, "<empty>"),
            FieldValue::Identifier(oid) => write!(f, "ObjectId(\"{}\")", oid.to_hex()),
            FieldValue::Scalar(b) => write!(f, "{b}"),
            FieldValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
