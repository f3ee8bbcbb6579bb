//! Nested-path lookup over JSON documents.

use crate::error::ExtractError;
use serde_json::Value;

/// Follow `path` key by key from `document`.
///
/// Fails with [`ExtractError::MissingKey`] naming the whole dotted path when
/// any key is absent or an intermediate value is not an object.
pub fn resolve<'a, S: AsRef<str>>(
    document: &'a Value,
    path: &[S],
) -> Result<&'a Value, ExtractError> {
    resolve_opt(document, path).ok_or_else(|| ExtractError::missing_key(path))
}

/// Like [`resolve`], but returns `None` instead of an error.
pub fn resolve_opt<'a, S: AsRef<str>>(document: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, key| {
        current.as_object()?.get(key.as_ref())
    })
}

/// Read an identifier that may be stored as a string or a number.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
