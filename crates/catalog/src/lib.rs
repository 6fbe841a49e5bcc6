//! # catalog
//!
//! Reference anomaly learners for the active sampler and a synthetic
//! multivariate time series generator with labeled anomalies.
//!
//! - [`ZScoreLearner`]: per-feature standard score
//! - [`IqrLearner`]: per-feature interquartile range fences
//! - [`synthetic::ornstein_uhlenbeck`]: mean-reverting process with jumps

mod error;
mod iqr;
pub mod synthetic;
mod zscore;

use active_spi::Learner;

pub use error::{CatalogError, Result};
pub use iqr::IqrLearner;
pub use synthetic::{ornstein_uhlenbeck, OrnsteinUhlenbeckConfig};
pub use zscore::ZScoreLearner;

/// Ordered name → learner mapping of every catalog learner with defaults.
pub fn default_learners() -> Vec<(String, Box<dyn Learner>)> {
    vec![
        ("zscore".to_string(), Box::new(ZScoreLearner::default()) as Box<dyn Learner>),
        ("iqr".to_string(), Box::new(IqrLearner::default()) as Box<dyn Learner>),
    ]
}

/// Check a matrix against the feature count seen at fit time.
pub(crate) fn check_features(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CatalogError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
