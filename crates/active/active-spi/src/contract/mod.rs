//! Contract definitions for active sampling.
//!
//! This module contains trait definitions that learner providers must implement.

mod learner;

pub use learner::{Learner, LearnerError, LearnerResult};
