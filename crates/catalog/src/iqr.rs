//! IQR-based anomaly learner

use active_spi::{Learner, LearnerResult, INLIER, OUTLIER};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{check_features, CatalogError, Result};

/// Per-feature quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Quartiles {
    q1: f64,
    median: f64,
    q3: f64,
}

impl Quartiles {
    fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// IQR-based anomaly learner
///
/// A sample is an outlier when any feature falls outside
/// `[q1 - m * iqr, q3 + m * iqr]`. Its normality score is minus the largest
/// distance to the feature median, in units of the feature's IQR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IqrLearner {
    multiplier: f64,
    quartiles: Vec<Quartiles>,
}

impl IqrLearner {
    /// Create a new IQR learner
    ///
    /// # Arguments
    ///
    /// * `multiplier` - IQR multiplier for the outlier fences
    pub fn new(multiplier: f64) -> Result<Self> {
        if multiplier.is_nan() || multiplier <= 0.0 {
            return Err(CatalogError::invalid("multiplier", "must be positive"));
        }

        Ok(Self {
            multiplier,
            quartiles: Vec::new(),
        })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn is_fitted(&self) -> bool {
        !self.quartiles.is_empty()
    }

    fn fitted(&self, x: ArrayView2<'_, f64>) -> Result<&[Quartiles]> {
        if self.quartiles.is_empty() {
            return Err(CatalogError::NotFitted);
        }
        check_features(self.quartiles.len(), x.ncols())?;
        Ok(&self.quartiles)
    }
}

impl Default for IqrLearner {
    fn default() -> Self {
        Self {
            multiplier: 1.5,
            quartiles: Vec::new(),
        }
    }
}

impl Learner for IqrLearner {
    fn fit(&mut self, x: ArrayView2<'_, f64>, _y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()> {
        if x.nrows() < 2 {
            return Err(CatalogError::InsufficientData {
                required: 2,
                actual: x.nrows(),
            }
            .into());
        }

        self.quartiles = x
            .axis_iter(Axis(1))
            .map(|col| {
                let mut sorted = col.to_vec();
                sorted.sort_by(f64::total_cmp);
                let n = sorted.len();
                Quartiles {
                    q1: sorted[n / 4],
                    median: sorted[n / 2],
                    q3: sorted[3 * n / 4],
                }
            })
            .collect();
        Ok(())
    }

    fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
        let quartiles = self.fitted(x)?;
        Ok(x.map_axis(Axis(1), |row| {
            let spread = row
                .iter()
                .zip(quartiles)
                .map(|(&v, q)| {
                    let iqr = q.iqr();
                    if iqr == 0.0 {
                        0.0
                    } else {
                        (v - q.median).abs() / iqr
                    }
                })
                .fold(0.0, f64::max);
            -spread
        }))
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>> {
        let quartiles = self.fitted(x)?;
        let m = self.multiplier;
        Ok(x.map_axis(Axis(1), |row| {
            let outside = row.iter().zip(quartiles).any(|(&v, q)| {
                let iqr = q.iqr();
                v < q.q1 - m * iqr || v > q.q3 + m * iqr
            });
            if outside {
                OUTLIER
            } else {
                INLIER
            }
        }))
    }
}
