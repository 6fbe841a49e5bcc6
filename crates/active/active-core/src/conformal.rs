//! Split-conformal anomaly detection.
//!
//! A [`CalibrationSet`] holds the nonconformity scores of a held-out
//! calibration sample. For a significance level `alpha` the decision
//! threshold is the `ceil((n + 1)(1 - alpha))`-th smallest calibration score,
//! so that, for test points exchangeable with the calibration points, the
//! rate of normal points flagged anomalous is at most `alpha`.

use std::sync::Arc;

use active_spi::{ActiveError, Result};
use ndarray::{Array1, ArrayView2};

use crate::committee::CommitteeMember;

/// Rounding slack when turning `(n + 1)(1 - alpha)` into a rank.
const RANK_EPSILON: f64 = 1e-9;

/// Check that `alpha` is a usable significance level.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(ActiveError::invalid(format!(
            "significance level must be in (0, 1), got {alpha}"
        )))
    }
}

/// Sorted nonconformity scores of a calibration sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSet {
    scores: Vec<f64>,
}

impl CalibrationSet {
    /// Build a calibration set from raw nonconformity scores.
    pub fn new(scores: impl IntoIterator<Item = f64>) -> Result<Self> {
        let mut scores: Vec<f64> = scores.into_iter().collect();
        if scores.is_empty() {
            return Err(ActiveError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if scores.iter().any(|s| s.is_nan()) {
            return Err(ActiveError::invalid("calibration scores contain NaN"));
        }
        scores.sort_by(f64::total_cmp);
        Ok(Self { scores })
    }

    /// Number of calibration points.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Always false: an empty calibration set cannot be built.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Calibration scores in ascending order.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Conformal threshold at `alpha`.
    ///
    /// Returns `+inf` when the calibration set is too small to reject
    /// anything at this level.
    pub fn threshold(&self, alpha: f64) -> Result<f64> {
        validate_alpha(alpha)?;
        let n = self.scores.len();
        let rank = (((n + 1) as f64) * (1.0 - alpha) - RANK_EPSILON).ceil().max(1.0) as usize;
        if rank > n {
            Ok(f64::INFINITY)
        } else {
            Ok(self.scores[rank - 1])
        }
    }

    /// Anomaly flags for the given nonconformity scores at `alpha`.
    pub fn flag(&self, nonconformity: &Array1<f64>, alpha: f64) -> Result<Array1<bool>> {
        let threshold = self.threshold(alpha)?;
        Ok(nonconformity.mapv(|s| s > threshold))
    }

    /// Conformal p-value of a nonconformity score.
    pub fn p_value(&self, score: f64) -> f64 {
        let below = self.scores.partition_point(|&s| s < score);
        let at_least = self.scores.len() - below;
        (at_least as f64 + 1.0) / (self.scores.len() as f64 + 1.0)
    }
}

/// Conformal wrapper around one committee member.
///
/// The detector borrows the member's learner and owns only its calibration.
#[derive(Debug, Clone)]
pub struct ConformalAnomalyDetector<'a> {
    member: &'a CommitteeMember,
    calibration: Option<Arc<CalibrationSet>>,
}

impl<'a> ConformalAnomalyDetector<'a> {
    /// Uncalibrated detector for `member`.
    pub fn new(member: &'a CommitteeMember) -> Self {
        Self {
            member,
            calibration: None,
        }
    }

    /// Detector reusing an existing calibration.
    pub fn with_calibration(member: &'a CommitteeMember, calibration: Arc<CalibrationSet>) -> Self {
        Self {
            member,
            calibration: Some(calibration),
        }
    }

    /// Name of the wrapped member.
    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn calibration(&self) -> Option<&Arc<CalibrationSet>> {
        self.calibration.as_ref()
    }

    /// Nonconformity scores: the negated learner normality scores.
    pub fn nonconformity(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        Ok(self.member.score_samples(x)?.mapv(|s| -s))
    }

    /// Replace the calibration with scores computed on `x_calib`.
    ///
    /// `x_calib` must be disjoint from anything queried later.
    pub fn calibrate(&mut self, x_calib: ArrayView2<'_, f64>) -> Result<Arc<CalibrationSet>> {
        let set = Arc::new(CalibrationSet::new(self.nonconformity(x_calib)?)?);
        self.calibration = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Conformal threshold at `alpha`.
    pub fn threshold(&self, alpha: f64) -> Result<f64> {
        self.calibrated()?.threshold(alpha)
    }

    /// Anomaly flag per row of `x` at significance level `alpha`.
    pub fn predict(&self, x: ArrayView2<'_, f64>, alpha: f64) -> Result<Array1<bool>> {
        let calibration = self.calibrated()?;
        validate_alpha(alpha)?;
        calibration.flag(&self.nonconformity(x)?, alpha)
    }

    /// Conformal p-value per row of `x`.
    pub fn p_values(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let calibration = self.calibrated()?;
        Ok(self.nonconformity(x)?.mapv(|s| calibration.p_value(s)))
    }

    fn calibrated(&self) -> Result<&CalibrationSet> {
        self.calibration
            .as_deref()
            .ok_or(ActiveError::NotCalibrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use active_spi::{Learner, LearnerResult};
    use ndarray::{array, Array2, ArrayView1};

    /// Normality equals the negated first feature, so nonconformity is the feature.
    struct Identity;

    impl Learner for Identity {
        fn fit(&mut self, _x: ArrayView2<'_, f64>, _y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()> {
            Ok(())
        }

        fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
            Ok(x.column(0).mapv(|v| -v))
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>> {
            Ok(Array1::from_elem(x.nrows(), 1))
        }
    }

    fn member() -> CommitteeMember {
        CommitteeMember::new("identity", Box::new(Identity))
    }

    fn column(values: impl IntoIterator<Item = f64>) -> Array2<f64> {
        let values: Vec<f64> = values.into_iter().collect();
        Array2::from_shape_vec((values.len(), 1), values).unwrap()
    }

    #[test]
    fn test_threshold_uses_finite_sample_rank() {
        let set = CalibrationSet::new((1..=50).map(f64::from)).unwrap();
        // ceil(51 * 0.9) = 46, ceil(51 * 0.1) = 6
        assert_eq!(set.threshold(0.1).unwrap(), 46.0);
        assert_eq!(set.threshold(0.9).unwrap(), 6.0);
    }

    #[test]
    fn test_threshold_exact_rank() {
        let set = CalibrationSet::new((1..=9).map(f64::from)).unwrap();
        // (9 + 1) * 0.9 = 9 exactly
        assert_eq!(set.threshold(0.1).unwrap(), 9.0);
    }

    #[test]
    fn test_small_set_cannot_reject() {
        let set = CalibrationSet::new([1.0, 2.0, 3.0]).unwrap();
        // ceil(4 * 0.95) = 4 > 3
        assert_eq!(set.threshold(0.05).unwrap(), f64::INFINITY);
        assert_eq!(set.flag(&array![1e9], 0.05).unwrap(), array![false]);
    }

    #[test]
    fn test_invalid_alpha() {
        let set = CalibrationSet::new([1.0]).unwrap();
        for alpha in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                set.threshold(alpha),
                Err(ActiveError::InvalidArguments(_))
            ));
        }
    }

    #[test]
    fn test_empty_and_nan_calibration_rejected() {
        assert!(matches!(
            CalibrationSet::new(Vec::new()),
            Err(ActiveError::InsufficientData { required: 1, actual: 0 })
        ));
        assert!(matches!(
            CalibrationSet::new([1.0, f64::NAN]),
            Err(ActiveError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_scores_are_sorted() {
        let set = CalibrationSet::new([3.0, -1.0, 2.0]).unwrap();
        assert_eq!(set.scores(), &[-1.0, 2.0, 3.0]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_p_value() {
        let set = CalibrationSet::new([1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((set.p_value(0.0) - 1.0).abs() < 1e-12);
        assert!((set.p_value(3.0) - 3.0 / 5.0).abs() < 1e-12);
        assert!((set.p_value(10.0) - 1.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_before_calibration_fails() {
        let member = member();
        let cad = ConformalAnomalyDetector::new(&member);
        assert!(!cad.is_calibrated());
        assert!(matches!(
            cad.predict(column([1.0]).view(), 0.1),
            Err(ActiveError::NotCalibrated)
        ));
        assert!(matches!(cad.threshold(0.1), Err(ActiveError::NotCalibrated)));
    }

    #[test]
    fn test_calibrate_then_predict() {
        let member = member();
        let mut cad = ConformalAnomalyDetector::new(&member);
        cad.calibrate(column((1..=50).map(f64::from)).view()).unwrap();

        let flags = cad.predict(column([0.0, 20.0, 47.0]).view(), 0.1).unwrap();
        assert_eq!(flags, array![false, false, true]);
        let flags = cad.predict(column([0.0, 20.0, 47.0]).view(), 0.9).unwrap();
        assert_eq!(flags, array![false, true, true]);
    }

    #[test]
    fn test_recalibration_replaces_scores() {
        let member = member();
        let mut cad = ConformalAnomalyDetector::new(&member);
        cad.calibrate(column((1..=50).map(f64::from)).view()).unwrap();
        let set = cad.calibrate(column((101..=110).map(f64::from)).view()).unwrap();

        assert_eq!(set.len(), 10);
        assert_eq!(cad.calibration().map(|c| c.len()), Some(10));
        assert_eq!(cad.name(), "identity");
    }

    #[test]
    fn test_larger_alpha_flags_superset() {
        let member = member();
        let mut cad = ConformalAnomalyDetector::new(&member);
        cad.calibrate(column((0..200).map(|i| ((i * 37) % 101) as f64)).view())
            .unwrap();
        let test = column((0..120).map(f64::from));

        let alphas = [0.01, 0.05, 0.1, 0.2, 0.5, 0.8, 0.99];
        let flags: Vec<Array1<bool>> = alphas
            .iter()
            .map(|&a| cad.predict(test.view(), a).unwrap())
            .collect();
        for pair in flags.windows(2) {
            for (strict, loose) in pair[0].iter().zip(pair[1].iter()) {
                assert!(!strict || *loose);
            }
        }
    }

    #[test]
    fn test_shared_calibration() {
        let member = member();
        let set = Arc::new(CalibrationSet::new((1..=9).map(f64::from)).unwrap());
        let cad = ConformalAnomalyDetector::with_calibration(&member, Arc::clone(&set));
        let p = cad.p_values(column([10.0]).view()).unwrap();
        assert!((p[0] - 0.1).abs() < 1e-12);
        assert_eq!(Arc::strong_count(&set), 2);
    }
}
