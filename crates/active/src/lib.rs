//! # active
//!
//! Active learning for time series anomaly detection.
//! Ranks unlabeled feature vectors for labeling with a committee of anomaly
//! learners and split-conformal decisions at controlled false-positive rates.

pub use active_facade::*;
