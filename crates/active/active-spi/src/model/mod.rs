//! Data models for active sampling.

mod prediction;
mod vote;

pub use prediction::Prediction;
pub use vote::{is_outlier, INLIER, OUTLIER};
