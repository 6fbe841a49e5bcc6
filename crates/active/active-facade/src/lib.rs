//! Active Sampling Facade
//!
//! High-level API for conformal committee active sampling. Re-exports all
//! public types from the active stack for convenient usage.
//!
//! # Example
//!
//! ```ignore
//! use active_facade::prelude::*;
//!
//! let mut sampler = ActiveSampler::new(learners)?;
//! sampler.fit(FitData::new().train(x_fit.view()).calibration(x_calib.view()))?;
//! let prediction = sampler.predict(x_test.view(), &[0.05, 0.2])?;
//! let picked = sampler.query(x_pool.view(), 10, &QueryStrategy::MaxDisagreement)?;
//! ```

// Re-export everything from core (which includes API and SPI)
pub use active_core::*;

/// Constants naming the query strategies.
pub mod tags {
    pub use active_api::{
        CONFORMAL_FPR_DISAGREEMENT, CONFORMAL_FPR_UNCERTAINTY, MAX_DISAGREEMENT, RANDOM,
        VOTE_ENTROPY,
    };
}

/// Prelude module for convenient imports
pub mod prelude {
    // Traits
    pub use active_spi::Learner;
    pub use active_core::CommitteeQuery;

    // Configuration and requests
    pub use active_api::{FitData, QueryStrategy, SamplerConfig, SamplerPhase};

    // Results and errors
    pub use active_spi::{ActiveError, LearnerError, LearnerResult, Prediction, Result};

    // Implementations
    pub use active_core::{
        ActiveSampler, CalibrationSet, Committee, ConformalAnomalyDetector,
    };
}
