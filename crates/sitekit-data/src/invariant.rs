//! Precondition assertions with literal, test-visible messages

use thiserror::Error;

/// A failed precondition. The message is part of the observable contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvariantViolation {
    message: String,
}

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Fail with `message` unless `condition` holds
pub fn invariant(condition: bool, message: &str) -> Result<(), InvariantViolation> {
    if condition {
        Ok(())
    } else {
        Err(InvariantViolation::new(message))
    }
}

/// Strict selection: an unresolved (`None`) selector result is a violation
/// naming the selector.
pub fn strict<T>(value: Option<T>, selector: &str) -> Result<T, InvariantViolation> {
    value.ok_or_else(|| InvariantViolation::new(format!("{selector}(...) is not resolved")))
}
