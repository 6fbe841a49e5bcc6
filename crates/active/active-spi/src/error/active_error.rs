//! Active sampling error types.

use thiserror::Error;

use crate::contract::LearnerError;

/// Errors raised by the committee, the conformal detectors and the sampler.
#[derive(Debug, Error)]
pub enum ActiveError {
    /// Arguments that cannot be acted upon.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Conformal prediction or query before any calibration.
    #[error("Committee not calibrated: call fit() with calibration data first")]
    NotCalibrated,

    /// A learner failed; its error is kept as the source.
    #[error("Learner '{learner}' failed: {source}")]
    Model {
        learner: String,
        #[source]
        source: LearnerError,
    },

    /// A learner returned the wrong number of values.
    #[error("Learner '{learner}' returned {actual} values for {expected} samples")]
    ShapeMismatch {
        learner: String,
        expected: usize,
        actual: usize,
    },

    /// Not enough samples for the operation.
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Strategy that is named but not available.
    #[error("Unsupported query strategy: {0}")]
    UnsupportedStrategy(String),
}

impl ActiveError {
    /// Wrap a learner failure with the committee member name.
    pub fn model(learner: impl Into<String>, source: LearnerError) -> Self {
        Self::Model {
            learner: learner.into(),
            source,
        }
    }

    /// Shorthand for [`ActiveError::InvalidArguments`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArguments(reason.into())
    }
}

/// Result type for active sampling operations.
pub type Result<T> = std::result::Result<T, ActiveError>;
