//! Synthetic multivariate time series with labeled anomalies.
//!
//! Samples an Ornstein-Uhlenbeck process on `t in [0, 1)`. At random instants
//! the process target jumps away from zero and then decays back, producing
//! short bursts that are labeled anomalous.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::{CatalogError, Result};

/// Ornstein-Uhlenbeck generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrnsteinUhlenbeckConfig {
    /// Diffusion scale (default: 1.0).
    pub noise_scale: f64,
    /// Speed of reversion towards the target (default: 3.0).
    pub mean_reverting: f64,
    /// Mean time between anomalies, as a fraction of the series (default: 0.1).
    pub anomaly_freq: f64,
    /// Decay time of an anomaly jump (default: 0.005).
    pub anomaly_duration: f64,
    /// Standard deviation of anomaly jumps (default: 40.0).
    pub anomaly_scale: f64,
    /// Random seed (default: 314).
    pub seed: u64,
}

impl Default for OrnsteinUhlenbeckConfig {
    fn default() -> Self {
        Self {
            noise_scale: 1.0,
            mean_reverting: 3.0,
            anomaly_freq: 0.1,
            anomaly_duration: 0.005,
            anomaly_scale: 40.0,
            seed: 314,
        }
    }
}

impl OrnsteinUhlenbeckConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn anomaly_scale(mut self, scale: f64) -> Self {
        self.anomaly_scale = scale;
        self
    }

    pub fn anomaly_freq(mut self, freq: f64) -> Self {
        self.anomaly_freq = freq;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("noise_scale", self.noise_scale),
            ("mean_reverting", self.mean_reverting),
            ("anomaly_freq", self.anomaly_freq),
            ("anomaly_duration", self.anomaly_duration),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(CatalogError::invalid(name, "must be positive"));
            }
        }
        if self.anomaly_scale.is_nan() || self.anomaly_scale < 0.0 {
            return Err(CatalogError::invalid("anomaly_scale", "must be non-negative"));
        }
        Ok(())
    }
}

/// Generate `n_rows` samples of an `n_cols`-dimensional process.
///
/// Returns the samples and a 0/1 label per row, 1 marking the start of an
/// anomaly.
pub fn ornstein_uhlenbeck(
    n_rows: usize,
    n_cols: usize,
    config: &OrnsteinUhlenbeckConfig,
) -> Result<(Array2<f64>, Array1<f64>)> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut x = Array2::<f64>::zeros((n_rows, n_cols));
    let mut y = Array1::<f64>::zeros(n_rows);
    let mut target = Array1::<f64>::zeros(n_cols);

    let dt = 1.0 / n_rows.max(1) as f64;
    let target_decay = (-dt / config.anomaly_duration).exp();
    let reversion = (-config.mean_reverting * dt).exp();
    let diffusion = config.noise_scale * dt.sqrt();
    let jump_probability = dt / config.anomaly_freq;

    for i in 1..n_rows {
        target *= target_decay;
        for j in 0..n_cols {
            let drift = target[j] + (x[[i - 1, j]] - target[j]) * reversion;
            let noise: f64 = rng.sample(StandardNormal);
            x[[i, j]] = drift + diffusion * noise;
        }
        if rng.gen::<f64>() < jump_probability {
            y[i] = 1.0;
            for j in 0..n_cols {
                let jump: f64 = rng.sample(StandardNormal);
                target[j] += config.anomaly_scale * jump;
            }
        }
    }

    Ok((x, y))
}
