//! Cache error types

use thiserror::Error;

/// Errors from the response cache and its storage backends
#[derive(Error, Debug)]
pub enum CacheError {
    /// Keys are request signatures and never empty
    #[error("Cache keys must not be empty")]
    EmptyKey,

    #[error("Failed to encode entry for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored entry does not match the requested payload type
    #[error("Failed to decode entry {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage backend error: {0}")]
    Storage(String),
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
