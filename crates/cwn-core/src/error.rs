//! Errors raised while reading and extracting planning documents.

use std::path::PathBuf;

/// Errors from document loading and record extraction.
///
/// Any of these aborts processing of the current document. Purely
/// informational absences (no actions, no links) are logged instead.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A configured nested path does not exist in the document.
    #[error("missing key: {path}")]
    MissingKey { path: String },
    /// The document has the expected containers but an entry is unusable.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    pub(crate) fn missing_key<S: AsRef<str>>(path: &[S]) -> Self {
        let joined: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
        Self::MissingKey {
            path: joined.join("."),
        }
    }
}
