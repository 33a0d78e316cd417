//! Data layer error types

use thiserror::Error;

use crate::invariant::InvariantViolation;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised synchronously by store actions and the registry.
///
/// Network failures are not represented here: they are captured into the
/// store's error state and read back through the error selectors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A required action argument was missing or malformed
    #[error("{0}")]
    Validation(String),

    /// A precondition assertion failed
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("No store registered under \"{0}\"")]
    NotRegistered(String),

    #[error("A store is already registered under \"{0}\"")]
    AlreadyRegistered(String),

    #[error("Store \"{name}\" is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// A resolver was requested outside of a tokio runtime
    #[error("No async runtime available to resolve {0}")]
    NoRuntime(String),

    #[error("Timed out waiting for store \"{0}\"")]
    Timeout(String),

    /// A spawned store task panicked or was cancelled
    #[error("Task for {0} did not complete")]
    Aborted(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }
}
