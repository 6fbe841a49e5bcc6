//! Z-Score based anomaly learner

use active_spi::{Learner, LearnerResult, INLIER, OUTLIER};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{check_features, CatalogError, Result};

/// Z-Score based anomaly learner
///
/// Standardises every feature with the training mean and standard deviation.
/// The normality score of a sample is minus its largest absolute z-score, and
/// the sample is an outlier when that z-score exceeds the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreLearner {
    threshold: f64,
    mean: Vec<f64>,
    std_dev: Vec<f64>,
    fitted: bool,
}

impl ZScoreLearner {
    /// Create a new Z-Score learner
    ///
    /// # Arguments
    ///
    /// * `threshold` - Number of standard deviations for the outlier vote
    pub fn new(threshold: f64) -> Result<Self> {
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(CatalogError::invalid("threshold", "must be positive"));
        }

        Ok(Self {
            threshold,
            mean: Vec::new(),
            std_dev: Vec::new(),
            fitted: false,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fitted per-feature means
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted per-feature standard deviations
    pub fn std_dev(&self) -> &[f64] {
        &self.std_dev
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Largest absolute z-score per sample
    fn max_abs_z(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(CatalogError::NotFitted);
        }
        check_features(self.mean.len(), x.ncols())?;

        Ok(x.map_axis(Axis(1), |row| {
            row.iter()
                .zip(self.mean.iter().zip(&self.std_dev))
                .map(|(&v, (&mean, &std_dev))| {
                    if std_dev == 0.0 {
                        0.0
                    } else {
                        ((v - mean) / std_dev).abs()
                    }
                })
                .fold(0.0, f64::max)
        }))
    }
}

impl Default for ZScoreLearner {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            mean: Vec::new(),
            std_dev: Vec::new(),
            fitted: false,
        }
    }
}

impl Learner for ZScoreLearner {
    fn fit(&mut self, x: ArrayView2<'_, f64>, _y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()> {
        if x.nrows() < 2 {
            return Err(CatalogError::InsufficientData {
                required: 2,
                actual: x.nrows(),
            }
            .into());
        }

        let n = x.nrows() as f64;
        self.mean = x.axis_iter(Axis(1)).map(|col| col.sum() / n).collect();
        self.std_dev = x
            .axis_iter(Axis(1))
            .zip(&self.mean)
            .map(|(col, &mean)| (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt())
            .collect();
        self.fitted = true;
        Ok(())
    }

    fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
        Ok(self.max_abs_z(x)?.mapv(|z| -z))
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>> {
        let threshold = self.threshold;
        Ok(self
            .max_abs_z(x)?
            .mapv(|z| if z > threshold { OUTLIER } else { INLIER }))
    }
}
