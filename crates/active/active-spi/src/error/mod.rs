//! Error types for active sampling.
//!
//! This module contains error types and the Result alias.

mod active_error;

pub use active_error::{ActiveError, Result};
