//! Active Sampling Core
//!
//! Core implementations for conformal committee active sampling:
//! - Committee of named anomaly learners
//! - Split-conformal anomaly detection per learner
//! - Committee and conformal query strategies
//! - The active sampler orchestrating fit, calibration, prediction and queries

mod committee;
mod conformal;
mod sampler;
mod strategy;

pub use committee::{Committee, CommitteeMember};
pub use conformal::{validate_alpha, CalibrationSet, ConformalAnomalyDetector};
pub use sampler::ActiveSampler;
pub use strategy::{
    conformal_uncertainty_votes, max_disagreement, select_top, vote_entropy, CommitteeQuery,
    MaxDisagreementSampling, RandomSampling, VoteEntropySampling,
};

// Re-export from API for convenience
pub use active_api::{FitData, QueryStrategy, SamplerConfig, SamplerPhase};

// Re-export SPI types
pub use active_spi::{
    is_outlier, ActiveError, Learner, LearnerError, LearnerResult, Prediction, Result, INLIER,
    OUTLIER,
};
