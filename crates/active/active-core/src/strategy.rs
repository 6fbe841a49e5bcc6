//! Committee query strategies.
//!
//! Every scored strategy ranks with [`select_top`]: a stable ascending sort by
//! score whose last `n` entries are returned, most informative first.

use active_spi::Result;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::committee::Committee;

/// Strategy that picks instances to label by looking at a live committee.
pub trait CommitteeQuery {
    /// Indices of at most `n_instances` rows of `x`, without duplicates.
    fn query(
        &self,
        committee: &Committee,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
    ) -> Result<Vec<usize>>;
}

/// KL max-disagreement sampling on hard votes.
///
/// The consensus probability of a vote value is the share of learners casting
/// it. A learner's disagreement with the consensus is `-ln(share of its own
/// vote)`, and a sample scores the largest disagreement in the committee.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDisagreementSampling;

impl CommitteeQuery for MaxDisagreementSampling {
    fn query(
        &self,
        committee: &Committee,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
    ) -> Result<Vec<usize>> {
        let votes = committee.vote(x)?;
        Ok(select_top(&max_disagreement(votes.view()), n_instances))
    }
}

/// Vote-entropy sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteEntropySampling;

impl CommitteeQuery for VoteEntropySampling {
    fn query(
        &self,
        committee: &Committee,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
    ) -> Result<Vec<usize>> {
        let votes = committee.vote(x)?;
        Ok(select_top(&vote_entropy(votes.view()), n_instances))
    }
}

/// Uniform random sampling, reproducible for a given seed.
#[derive(Debug, Clone, Copy)]
pub struct RandomSampling {
    seed: u64,
}

impl RandomSampling {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl CommitteeQuery for RandomSampling {
    fn query(
        &self,
        _committee: &Committee,
        x: ArrayView2<'_, f64>,
        n_instances: usize,
    ) -> Result<Vec<usize>> {
        let n = x.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(rand::seq::index::sample(&mut rng, n, n_instances.min(n)).into_vec())
    }
}

/// Disagreement score per row of a `(n_samples, n_learners)` vote matrix.
pub fn max_disagreement(votes: ArrayView2<'_, i8>) -> Vec<f64> {
    votes
        .axis_iter(Axis(0))
        .map(|row| {
            let n = row.len() as f64;
            vote_counts(row)
                .into_iter()
                .map(|(_, count)| -(count as f64 / n).ln())
                .fold(0.0, f64::max)
        })
        .collect()
}

/// Entropy of the vote distribution per row.
pub fn vote_entropy(votes: ArrayView2<'_, i8>) -> Vec<f64> {
    votes
        .axis_iter(Axis(0))
        .map(|row| {
            let n = row.len() as f64;
            vote_counts(row)
                .into_iter()
                .map(|(_, count)| {
                    let p = count as f64 / n;
                    -p * p.ln()
                })
                .sum()
        })
        .collect()
}

/// Number of learners whose conformal decision differs between two levels.
///
/// Both inputs are `(n_samples, n_learners)` decision matrices.
pub fn conformal_uncertainty_votes(
    first: ArrayView2<'_, bool>,
    second: ArrayView2<'_, bool>,
) -> Vec<f64> {
    first
        .rows()
        .into_iter()
        .zip(second.rows())
        .map(|(a, b)| a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as f64)
        .collect()
}

/// Indices of the `n` highest scores, highest first.
///
/// Ties keep index order under a stable ascending sort, so among equal
/// scores at the cut the later indices are kept.
pub fn select_top(scores: &[f64], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let keep = n.min(indices.len());
    let mut selected = indices.split_off(indices.len() - keep);
    selected.reverse();
    debug!(requested = n, selected = selected.len(), "ranked instances");
    selected
}

fn vote_counts(row: ArrayView1<'_, i8>) -> Vec<(i8, usize)> {
    let mut counts: Vec<(i8, usize)> = Vec::new();
    for &vote in row {
        match counts.iter_mut().find(|(value, _)| *value == vote) {
            Some((_, count)) => *count += 1,
            None => counts.push((vote, 1)),
        }
    }
    counts
}
