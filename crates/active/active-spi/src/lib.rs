//! Active Sampling Service Provider Interface
//!
//! Defines the learner contract, error types and result models shared by
//! the committee, the conformal detectors and the active sampler.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{Learner, LearnerError, LearnerResult};
pub use error::{ActiveError, Result};
pub use model::{is_outlier, Prediction, INLIER, OUTLIER};
