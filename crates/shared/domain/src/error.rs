//! Domain-level errors.
//!
//! These errors describe domain values that could not be parsed or
//! validated. They are independent of the document and object stores.

use thiserror::Error;

/// Domain-specific errors for invalid input values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed for a field or input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A value did not match any known variant
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create an unknown-value error
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        DomainError::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}
