//! Target document identifier
//!
//! The merge path writes into one specific document. Its `_id` comes from
//! configuration as a string or an integer; a 24-character hex string becomes
//! a store-native `ObjectId`, anything else is used verbatim.

use crate::domain::errors::SiphonError;
use bson::oid::ObjectId;
use bson::Bson;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn object_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-fA-F0-9]{24}$").expect("static regex is valid"))
}

/// Returns true if `value` has the textual shape of an `ObjectId`
pub fn looks_like_object_id(value: &str) -> bool {
    object_id_pattern().is_match(value)
}

/// Identifier of the document the merge path writes into
///
/// # Examples
///
/// ```
/// use siphon::domain::ids::TargetDocumentId;
///
/// let id = TargetDocumentId::parse("68a8c8207090be6dd0e23a90");
/// assert!(matches!(id, TargetDocumentId::ObjectId(_)));
///
/// let id = TargetDocumentId::parse("daily-snapshot");
/// assert_eq!(id.to_string(), "daily-snapshot");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetDocumentId {
    /// Store-native identifier
    ObjectId(ObjectId),
    /// Any other string `_id`
    Raw(String),
    /// Integer `_id`
    Int(i64),
}

impl TargetDocumentId {
    /// Parses a configured identifier
    ///
    /// A conversion failure on an identifier-shaped string degrades to the raw
    /// string rather than failing.
    pub fn parse(value: &str) -> Self {
        if !looks_like_object_id(value) {
            return TargetDocumentId::Raw(value.to_string());
        }

        match ObjectId::parse_str(value) {
            Ok(oid) => TargetDocumentId::ObjectId(oid),
            Err(e) => {
                let err = SiphonError::Normalization(format!(
                    "'{value}' looks like an ObjectId but could not be parsed: {e}"
                ));
                tracing::debug!(error = %err, "Using target document id verbatim");
                TargetDocumentId::Raw(value.to_string())
            }
        }
    }

    /// BSON value used in the `_id` filter
    pub fn to_bson(&self) -> Bson {
        match self {
            TargetDocumentId::ObjectId(oid) => Bson::ObjectId(*oid),
            TargetDocumentId::Raw(s) => Bson::String(s.clone()),
            TargetDocumentId::Int(n) => Bson::Int64(*n),
        }
    }
}

impl fmt::Display for TargetDocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDocumentId::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            TargetDocumentId::Raw(s) => write!(f, "{s}"),
            TargetDocumentId::Int(n) => write!(f, "{n}"),
        }
    }
}
