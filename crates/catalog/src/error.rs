//! Catalog error types.

use thiserror::Error;

/// Errors raised by catalog learners and generators.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Learner must be fitted before scoring")]
    NotFitted,

    #[error("Expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl CatalogError {
    pub(crate) fn invalid(name: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
