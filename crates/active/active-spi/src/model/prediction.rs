//! Aggregate committee prediction.

use ndarray::{Array2, Array3, ArrayView2};

/// Output of the active sampler's `predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw committee votes, shape `(n_samples, n_learners)`.
    pub ads_results: Array2<i8>,
    /// Conformal decisions, shape `(n_alphas, n_samples, n_learners)`.
    /// `true` means anomalous at that significance level.
    pub cads_results: Array3<bool>,
}

impl Prediction {
    /// Create a new prediction.
    pub fn new(ads_results: Array2<i8>, cads_results: Array3<bool>) -> Self {
        Self {
            ads_results,
            cads_results,
        }
    }

    /// Number of predicted samples.
    pub fn n_samples(&self) -> usize {
        self.ads_results.nrows()
    }

    /// Number of committee members.
    pub fn n_learners(&self) -> usize {
        self.ads_results.ncols()
    }

    /// Number of significance levels.
    pub fn n_alphas(&self) -> usize {
        self.cads_results.shape()[0]
    }

    /// Conformal decisions for the `i`-th significance level.
    pub fn conformal_at(&self, i: usize) -> Option<ArrayView2<'_, bool>> {
        (i < self.n_alphas()).then(|| self.cads_results.index_axis(ndarray::Axis(0), i))
    }

    /// Indices of samples flagged anomalous by `learner` at the `i`-th level.
    pub fn anomaly_indices(&self, i: usize, learner: usize) -> Vec<usize> {
        match self.conformal_at(i) {
            Some(decisions) if learner < decisions.ncols() => decisions
                .column(learner)
                .iter()
                .enumerate()
                .filter_map(|(idx, &flag)| if flag { Some(idx) } else { None })
                .collect(),
            _ => Vec::new(),
        }
    }
}
