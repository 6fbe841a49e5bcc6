//! Active Sampling API
//!
//! Configuration types, query strategy selection and request DTOs for the
//! active sampler.

use std::fmt;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use active_spi::{
    is_outlier, ActiveError, Learner, LearnerError, LearnerResult, Prediction, Result, INLIER,
    OUTLIER,
};

// ============================================================================
// Sampler Configuration
// ============================================================================

/// Active sampler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Seed for randomised query strategies (default: 42).
    pub random_state: u64,
    /// Fan per-learner work out across threads (default: true).
    pub parallel: bool,
    /// Smallest accepted calibration set (default: 1).
    pub min_calibration_size: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            random_state: 42,
            parallel: true,
            min_calibration_size: 1,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed used by randomised strategies.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Enable or disable per-learner parallelism.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the minimum calibration set size.
    pub fn min_calibration_size(mut self, size: usize) -> Self {
        self.min_calibration_size = size.max(1);
        self
    }
}

// ============================================================================
// Query Strategies
// ============================================================================

/// Tag of the conformal uncertainty strategy.
pub const CONFORMAL_FPR_UNCERTAINTY: &str = "conformal_fpr_uncertainty";
/// Tag of the reserved conformal disagreement strategy.
pub const CONFORMAL_FPR_DISAGREEMENT: &str = "conformal_fpr_disagreement";
/// Tag of KL max-disagreement committee sampling.
pub const MAX_DISAGREEMENT: &str = "max_disagreement";
/// Tag of vote-entropy committee sampling.
pub const VOTE_ENTROPY: &str = "vote_entropy";
/// Tag of uniform random sampling.
pub const RANDOM: &str = "random";

/// Strategy used to rank unlabeled instances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// Instances whose conformal decision flips between two significance levels.
    ConformalFprUncertainty { alphas: (f64, f64) },
    /// Calibrated disagreement variant. Reserved, not available yet.
    ConformalFprDisagreement { alphas: (f64, f64) },
    /// KL max-disagreement over raw committee votes.
    #[default]
    MaxDisagreement,
    /// Entropy of the raw committee vote distribution.
    VoteEntropy,
    /// Uniform random selection.
    Random,
}

impl QueryStrategy {
    /// Build the conformal uncertainty strategy from a runtime alpha list.
    pub fn conformal_fpr_uncertainty(alphas: &[f64]) -> Result<Self> {
        Ok(Self::ConformalFprUncertainty {
            alphas: alpha_pair(alphas)?,
        })
    }

    /// Build a strategy from its string tag.
    ///
    /// Conformal tags need exactly two alphas; other tags ignore `alphas`.
    pub fn from_tag(tag: &str, alphas: &[f64]) -> Result<Self> {
        match tag {
            CONFORMAL_FPR_UNCERTAINTY => Self::conformal_fpr_uncertainty(alphas),
            CONFORMAL_FPR_DISAGREEMENT => Ok(Self::ConformalFprDisagreement {
                alphas: alpha_pair(alphas)?,
            }),
            MAX_DISAGREEMENT => Ok(Self::MaxDisagreement),
            VOTE_ENTROPY => Ok(Self::VoteEntropy),
            RANDOM => Ok(Self::Random),
            other => Err(ActiveError::UnsupportedStrategy(other.to_string())),
        }
    }

    /// Whether the strategy consumes conformal decisions.
    pub fn is_conformal(&self) -> bool {
        matches!(
            self,
            Self::ConformalFprUncertainty { .. } | Self::ConformalFprDisagreement { .. }
        )
    }

    /// String tag of the strategy.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ConformalFprUncertainty { .. } => CONFORMAL_FPR_UNCERTAINTY,
            Self::ConformalFprDisagreement { .. } => CONFORMAL_FPR_DISAGREEMENT,
            Self::MaxDisagreement => MAX_DISAGREEMENT,
            Self::VoteEntropy => VOTE_ENTROPY,
            Self::Random => RANDOM,
        }
    }

    /// Whether `tag` names a conformal strategy.
    pub fn is_conformal_tag(tag: &str) -> bool {
        tag == CONFORMAL_FPR_UNCERTAINTY || tag == CONFORMAL_FPR_DISAGREEMENT
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

fn alpha_pair(alphas: &[f64]) -> Result<(f64, f64)> {
    match alphas {
        [a, b] => Ok((*a, *b)),
        _ => Err(ActiveError::invalid(format!(
            "alphas should be a list of two elements, got {}",
            alphas.len()
        ))),
    }
}

// ============================================================================
// Fit Request
// ============================================================================

/// Data handed to the sampler's `fit`.
///
/// At least one of the training or calibration matrices must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitData<'a> {
    pub x_fit: Option<ArrayView2<'a, f64>>,
    pub y_fit: Option<ArrayView1<'a, f64>>,
    pub x_calib: Option<ArrayView2<'a, f64>>,
}

impl<'a> FitData<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Training samples for the committee.
    pub fn train(mut self, x: ArrayView2<'a, f64>) -> Self {
        self.x_fit = Some(x);
        self
    }

    /// Optional training labels forwarded to every learner.
    pub fn labels(mut self, y: ArrayView1<'a, f64>) -> Self {
        self.y_fit = Some(y);
        self
    }

    /// Calibration samples, disjoint from anything queried later.
    pub fn calibration(mut self, x: ArrayView2<'a, f64>) -> Self {
        self.x_calib = Some(x);
        self
    }

    /// Whether neither training nor calibration data was supplied.
    pub fn is_empty(&self) -> bool {
        self.x_fit.is_none() && self.x_calib.is_none()
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle phase of an active sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerPhase {
    Created,
    Fitted,
    Calibrated,
    FittedAndCalibrated,
}

impl SamplerPhase {
    pub fn from_flags(fitted: bool, calibrated: bool) -> Self {
        match (fitted, calibrated) {
            (false, false) => Self::Created,
            (true, false) => Self::Fitted,
            (false, true) => Self::Calibrated,
            (true, true) => Self::FittedAndCalibrated,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Self::Calibrated | Self::FittedAndCalibrated)
    }
}
