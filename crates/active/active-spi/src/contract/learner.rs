//! Anomaly learner trait definition.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Error returned by a learner implementation.
///
/// Learners come from outside this workspace, so their failures are carried
/// opaquely and surfaced to the caller unchanged.
pub type LearnerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for learner operations.
pub type LearnerResult<T> = std::result::Result<T, LearnerError>;

/// Anomaly scoring model that can sit in a committee.
///
/// Rows of `x` are samples, columns are features. Implementations must
/// return exactly one value per row.
pub trait Learner: Send + Sync {
    /// Fit the learner on training data. `y` is optional and may be ignored.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()>;

    /// Measure of normality of each sample. The lower, the more abnormal.
    fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>>;

    /// Per-sample decision: `+1` for inliers, `-1` for outliers.
    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>>;
}
