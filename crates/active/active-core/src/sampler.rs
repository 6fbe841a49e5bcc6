//! Active sampler: committee, per-learner conformal detectors and queries.

use std::sync::Arc;

use active_api::{FitData, QueryStrategy, SamplerConfig, SamplerPhase};
use active_spi::{ActiveError, Learner, Prediction, Result};
use ndarray::{Array3, ArrayView2, Axis};
use tracing::{debug, info};

use crate::committee::{stack_columns, Committee};
use crate::conformal::{validate_alpha, CalibrationSet, ConformalAnomalyDetector};
use crate::strategy::{
    conformal_uncertainty_votes, select_top, CommitteeQuery, MaxDisagreementSampling,
    RandomSampling, VoteEntropySampling,
};

/// Active learning sampler over a committee of anomaly learners.
///
/// Lifecycle: `Created -> {Fitted, Calibrated, FittedAndCalibrated}`. Fitting
/// through the sampler discards any calibration, since the scores it was
/// computed from no longer match the learners.
///
/// # Example
///
/// ```rust,ignore
/// use active_facade::prelude::*;
///
/// let mut sampler = ActiveSampler::new(catalog::default_learners())?;
/// sampler.fit(FitData::new().train(x_fit.view()).calibration(x_calib.view()))?;
/// let strategy = QueryStrategy::conformal_fpr_uncertainty(&[0.1, 0.9])?;
/// let to_label = sampler.query(x_pool.view(), 10, &strategy)?;
/// ```
#[derive(Debug)]
pub struct ActiveSampler {
    committee: Committee,
    config: SamplerConfig,
    fitted: bool,
    /// One calibration per member, in committee order; replaced as a whole.
    calibration: Option<Vec<Arc<CalibrationSet>>>,
}

impl ActiveSampler {
    /// Create a sampler with the default configuration.
    pub fn new<I, S>(learners: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Box<dyn Learner>)>,
        S: Into<String>,
    {
        Self::with_config(learners, SamplerConfig::default())
    }

    /// Create a sampler from an ordered name → learner mapping.
    pub fn with_config<I, S>(learners: I, config: SamplerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Box<dyn Learner>)>,
        S: Into<String>,
    {
        let committee = Committee::new(learners)?.with_parallel(config.parallel);
        debug!(size_committee = committee.len(), "created active sampler");
        Ok(Self {
            committee,
            config,
            fitted: false,
            calibration: None,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn committee(&self) -> &Committee {
        &self.committee
    }

    /// Number of learners in the committee.
    pub fn size_committee(&self) -> usize {
        self.committee.len()
    }

    pub fn learner_names(&self) -> Vec<&str> {
        self.committee.names()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn phase(&self) -> SamplerPhase {
        SamplerPhase::from_flags(self.fitted, self.is_calibrated())
    }

    /// Conformal detector of every member, in committee order.
    pub fn detectors(&self) -> Vec<ConformalAnomalyDetector<'_>> {
        let members = self.committee.members();
        match &self.calibration {
            Some(sets) => members
                .iter()
                .zip(sets)
                .map(|(member, set)| {
                    ConformalAnomalyDetector::with_calibration(member, Arc::clone(set))
                })
                .collect(),
            None => members.iter().map(ConformalAnomalyDetector::new).collect(),
        }
    }

    /// Fit and/or calibrate the committee.
    ///
    /// Training runs before calibration when both are given. At least one of
    /// the two matrices is required.
    pub fn fit(&mut self, data: FitData<'_>) -> Result<()> {
        if data.is_empty() {
            return Err(ActiveError::invalid(
                "either X_fit or X_calib should be provided",
            ));
        }

        if let Some(x_fit) = data.x_fit {
            info!(
                size_committee = self.committee.len(),
                n_samples = x_fit.nrows(),
                "fitting the committee"
            );
            self.calibration = None;
            self.committee.fit(x_fit, data.y_fit)?;
            self.fitted = true;
        }

        if let Some(x_calib) = data.x_calib {
            self.calibrate(x_calib)?;
        }

        Ok(())
    }

    /// Calibrate every member on the same data and commit all sets at once.
    fn calibrate(&mut self, x_calib: ArrayView2<'_, f64>) -> Result<()> {
        let required = self.config.min_calibration_size;
        if x_calib.nrows() < required {
            return Err(ActiveError::InsufficientData {
                required,
                actual: x_calib.nrows(),
            });
        }

        info!(
            size_committee = self.committee.len(),
            n_samples = x_calib.nrows(),
            "calibrating the committee"
        );
        let sets = self
            .committee
            .map_members(|_, member| ConformalAnomalyDetector::new(member).calibrate(x_calib))?;
        self.calibration = Some(sets);
        info!("committee calibrated");
        Ok(())
    }

    /// Raw committee votes and conformal decisions for every alpha.
    ///
    /// `cads_results` has shape `(alphas.len(), n_samples, n_learners)` and is
    /// empty when no alpha is given. Any alpha requires calibration.
    pub fn predict(&self, x: ArrayView2<'_, f64>, alphas: &[f64]) -> Result<Prediction> {
        let cads_results = self.conformal_decisions(x, alphas)?;
        let ads_results = self.committee.vote(x)?;
        Ok(Prediction::new(ads_results, cads_results))
    }

    fn conformal_decisions(&self, x: ArrayView2<'_, f64>, alphas: &[f64]) -> Result<Array3<bool>> {
        let n_samples = x.nrows();
        let n_learners = self.committee.len();
        if alphas.is_empty() {
            return Ok(Array3::from_elem((0, n_samples, n_learners), false));
        }

        let sets = self.calibration.as_ref().ok_or(ActiveError::NotCalibrated)?;
        alphas.iter().try_for_each(|&alpha| validate_alpha(alpha))?;

        // per learner: one decision vector per alpha
        let per_learner = self.committee.map_members(|i, member| {
            let cad = ConformalAnomalyDetector::with_calibration(member, Arc::clone(&sets[i]));
            let nonconformity = cad.nonconformity(x)?;
            alphas
                .iter()
                .map(|&alpha| sets[i].flag(&nonconformity, alpha))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut out = Array3::from_elem((alphas.len(), n_samples, n_learners), false);
        for (k, mut level) in out.axis_iter_mut(Axis(0)).enumerate() {
            let columns: Vec<_> = per_learner.iter().map(|flags| flags[k].clone()).collect();
            level.assign(&stack_columns(&columns, n_samples));
        }
        Ok(out)
    }

    /// Indices of the `n_instances` rows of `x` most worth labeling.
    ///
    /// Returns `min(n_instances, x.nrows())` distinct indices, most
    /// informative first. This is the reverse of an ascending
    /// `argsort(scores)[-n:]` cut: the same set, in descending order.
    pub fn query(
        &self,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
        strategy: &QueryStrategy,
    ) -> Result<Vec<usize>> {
        if strategy.is_conformal() && !self.is_calibrated() {
            return Err(ActiveError::NotCalibrated);
        }
        debug!(%strategy, n_instances, n_samples = x.nrows(), "querying instances");

        match *strategy {
            QueryStrategy::ConformalFprUncertainty { alphas } => {
                self.conformal_uncertainty_committee(x, alphas, n_instances)
            }
            QueryStrategy::ConformalFprDisagreement { .. } => {
                Err(ActiveError::UnsupportedStrategy(strategy.tag().to_string()))
            }
            QueryStrategy::MaxDisagreement => {
                MaxDisagreementSampling.query(&self.committee, x, n_instances)
            }
            QueryStrategy::VoteEntropy => VoteEntropySampling.query(&self.committee, x, n_instances),
            QueryStrategy::Random => {
                RandomSampling::new(self.config.random_state).query(&self.committee, x, n_instances)
            }
        }
    }

    /// Query with a strategy named by its string tag.
    ///
    /// Conformal tags are checked for calibration before their alphas.
    pub fn query_by_tag(
        &self,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
        alphas: &[f64],
        tag: &str,
    ) -> Result<Vec<usize>> {
        if QueryStrategy::is_conformal_tag(tag) && !self.is_calibrated() {
            return Err(ActiveError::NotCalibrated);
        }
        let strategy = QueryStrategy::from_tag(tag, alphas)?;
        self.query(x, n_instances, &strategy)
    }

    /// Rank rows by how many learners change their conformal decision
    /// between the two significance levels.
    fn conformal_uncertainty_committee(
        &self,
        x: ArrayView2<'_, f64>,
        alphas: (f64, f64),
        n_instances: usize,
    ) -> Result<Vec<usize>> {
        let decisions = self.conformal_decisions(x, &[alphas.0, alphas.1])?;
        let votes = conformal_uncertainty_votes(
            decisions.index_axis(Axis(0), 0),
            decisions.index_axis(Axis(0), 1),
        );
        Ok(select_top(&votes, n_instances))
    }
}
