//! Error types for catdiff kernel operations.

/// Errors arising from malformed inputs or failed reads of entity documents.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An input document does not have the shape an operation requires.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An item type label is not one of the known entity kinds.
    #[error("unknown item type `{0}`")]
    UnknownItemType(String),

    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Storage or I/O failure while persisting canonical output.
    #[error("storage error: {0}")]
    Storage(String),
}
