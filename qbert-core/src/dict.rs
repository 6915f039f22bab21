//! Re-keying of list responses by a dotted field path
//!
//! Qbert list endpoints return plain arrays. Name-based operations need them
//! indexed, so [`keyed_list_to_map`] turns `[{"name": "a", ..}, ..]` into
//! `{"a": {"name": "a", ..}, ..}`.
use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Failure to resolve a dotted path inside a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    /// A path segment was absent, or the value at that step was not an object
    #[error("key '{segment}' of path '{path}' not found")]
    Missing {
        /// The full dotted path
        path: String,
        /// The segment that could not be resolved
        segment: String,
    },

    /// The value at the path cannot be used as a map key
    #[error("value at path '{path}' is not usable as a key: {value}")]
    InvalidKey {
        /// The full dotted path
        path: String,
        /// The offending value
        value: Value,
    },
}

/// Walk `path` through nested objects of `record`.
///
/// Segments are separated by `.`, and each one is used as an object key.
pub fn value_at_path<'a>(record: &'a Value, path: &str) -> Result<&'a Value, KeyPathError> {
    path.split('.').try_fold(record, |current, segment| {
        current
            .as_object()
            .and_then(|obj| obj.get(segment))
            .ok_or_else(|| KeyPathError::Missing {
                path: path.to_string(),
                segment: segment.to_string(),
            })
    })
}

fn key_at_path(record: &Value, path: &str) -> Result<String, KeyPathError> {
    match value_at_path(record, path)? {
        Value::String(s) => Ok(s.clone()),
        v @ (Value::Number(_) | Value::Bool(_)) => Ok(v.to_string()),
        other => Err(KeyPathError::InvalidKey {
            path: path.to_string(),
            value: other.clone(),
        }),
    }
}

/// Convert a list of records into a map keyed by the value found at `path`.
///
/// Later records overwrite earlier ones that share a key.
pub fn keyed_list_to_map<'a, I>(records: I, path: &str) -> Result<BTreeMap<String, Value>, KeyPathError>
where
    I: IntoIterator<Item = &'a Value>,
{
    records
        .into_iter()
        .map(|record| -> Result<_, KeyPathError> { Ok((key_at_path(record, path)?, record.clone())) })
        .collect()
}
