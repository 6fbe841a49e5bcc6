//! Committee vote encoding.

/// Vote cast by a learner for a normal sample.
pub const INLIER: i8 = 1;

/// Vote cast by a learner for an abnormal sample.
pub const OUTLIER: i8 = -1;

/// Whether a vote flags the sample as an outlier.
pub fn is_outlier(vote: i8) -> bool {
    vote == OUTLIER
}
