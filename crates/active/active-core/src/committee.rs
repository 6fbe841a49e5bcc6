//! Committee of anomaly learners.

use std::collections::HashSet;
use std::fmt;

use active_spi::{ActiveError, Learner, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Named learner inside a committee.
pub struct CommitteeMember {
    name: String,
    learner: Box<dyn Learner>,
}

impl CommitteeMember {
    /// Create a member from a name and a learner.
    pub fn new(name: impl Into<String>, learner: Box<dyn Learner>) -> Self {
        Self {
            name: name.into(),
            learner,
        }
    }

    /// Member name, unique within its committee.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped learner.
    pub fn learner(&self) -> &dyn Learner {
        self.learner.as_ref()
    }

    /// Fit the wrapped learner.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: Option<ArrayView1<'_, f64>>) -> Result<()> {
        debug!(learner = %self.name, n_samples = x.nrows(), "fitting learner");
        self.learner.fit(x, y).map_err(|source| self.failure(source))
    }

    /// Normality scores of the wrapped learner, one per row.
    pub fn score_samples(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let scores = self
            .learner
            .score_samples(x)
            .map_err(|source| self.failure(source))?;
        self.check_len(x.nrows(), scores.len())?;
        Ok(scores)
    }

    /// Inlier/outlier votes of the wrapped learner, one per row.
    pub fn vote(&self, x: ArrayView2<'_, f64>) -> Result<Array1<i8>> {
        let votes = self
            .learner
            .predict(x)
            .map_err(|source| self.failure(source))?;
        self.check_len(x.nrows(), votes.len())?;
        Ok(votes)
    }

    fn failure(&self, source: active_spi::LearnerError) -> ActiveError {
        warn!(learner = %self.name, error = %source, "learner failed");
        ActiveError::model(&self.name, source)
    }

    fn check_len(&self, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(ActiveError::ShapeMismatch {
                learner: self.name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CommitteeMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitteeMember")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered, fixed-membership ensemble of learners.
///
/// Member order is the column order of every per-learner result.
#[derive(Debug)]
pub struct Committee {
    members: Vec<CommitteeMember>,
    parallel: bool,
}

impl Committee {
    /// Build a committee from an ordered name → learner mapping.
    ///
    /// Fails when the mapping is empty or a name repeats.
    pub fn new<I, S>(learners: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Box<dyn Learner>)>,
        S: Into<String>,
    {
        let members: Vec<CommitteeMember> = learners
            .into_iter()
            .map(|(name, learner)| CommitteeMember::new(name, learner))
            .collect();

        if members.is_empty() {
            return Err(ActiveError::invalid("a committee needs at least one learner"));
        }

        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            if !seen.insert(member.name()) {
                return Err(ActiveError::invalid(format!(
                    "duplicate learner name '{}'",
                    member.name()
                )));
            }
        }

        Ok(Self {
            members,
            parallel: true,
        })
    }

    /// Enable or disable fanning per-learner work out on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of learners.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed committee.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in committee order.
    pub fn members(&self) -> &[CommitteeMember] {
        &self.members
    }

    /// Learner names in committee order.
    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(CommitteeMember::name).collect()
    }

    /// Look a member up by name.
    pub fn get(&self, name: &str) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Fit every learner on the same data.
    ///
    /// There is no rollback: when one learner fails, the others may already
    /// be refitted and the committee must be treated as unusable.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: Option<ArrayView1<'_, f64>>) -> Result<()> {
        if self.parallel {
            self.members
                .par_iter_mut()
                .try_for_each(|member| member.fit(x, y))
        } else {
            self.members.iter_mut().try_for_each(|member| member.fit(x, y))
        }
    }

    /// Raw votes, shape `(n_samples, n_learners)`.
    pub fn vote(&self, x: ArrayView2<'_, f64>) -> Result<Array2<i8>> {
        let columns = self.map_members(|_, member| member.vote(x))?;
        Ok(stack_columns(&columns, x.nrows()))
    }

    /// Normality scores, shape `(n_samples, n_learners)`.
    pub fn score_samples(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let columns = self.map_members(|_, member| member.score_samples(x))?;
        Ok(stack_columns(&columns, x.nrows()))
    }

    /// Run `f` on every member and collect the results in committee order.
    pub(crate) fn map_members<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize, &CommitteeMember) -> Result<T> + Send + Sync,
    {
        if self.parallel {
            self.members
                .par_iter()
                .enumerate()
                .map(|(i, member)| f(i, member))
                .collect()
        } else {
            self.members
                .iter()
                .enumerate()
                .map(|(i, member)| f(i, member))
                .collect()
        }
    }
}

/// Place per-learner vectors side by side as matrix columns.
pub(crate) fn stack_columns<T: Clone + Default>(
    columns: &[Array1<T>],
    n_rows: usize,
) -> Array2<T> {
    let mut out = Array2::default((n_rows, columns.len()));
    for (j, column) in columns.iter().enumerate() {
        out.column_mut(j).assign(column);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use active_spi::{LearnerResult, INLIER, OUTLIER};
    use ndarray::array;

    /// Flags rows whose first feature exceeds `limit`.
    struct Threshold {
        limit: f64,
        fail_fit: bool,
    }

    impl Learner for Threshold {
        fn fit(&mut self, _x: ArrayView2<'_, f64>, _y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()> {
            if self.fail_fit {
                return Err("fit exploded".into());
            }
            Ok(())
        }

        fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
            Ok(x.column(0).mapv(|v| -v))
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>> {
            Ok(x.column(0).mapv(|v| if v > self.limit { OUTLIER } else { INLIER }))
        }
    }

    /// Returns one value fewer than asked for.
    struct Short;

    impl Learner for Short {
        fn fit(&mut self, _x: ArrayView2<'_, f64>, _y: Option<ArrayView1<'_, f64>>) -> LearnerResult<()> {
            Ok(())
        }

        fn score_samples(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
            Ok(Array1::zeros(x.nrows().saturating_sub(1)))
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<i8>> {
            Ok(Array1::from_elem(x.nrows().saturating_sub(1), INLIER))
        }
    }

    fn threshold(limit: f64) -> Box<dyn Learner> {
        Box::new(Threshold {
            limit,
            fail_fit: false,
        })
    }

    #[test]
    fn test_vote_columns_follow_member_order() {
        let committee = Committee::new(vec![("loose", threshold(5.0)), ("strict", threshold(1.0))])
            .unwrap();
        let x = array![[0.0], [3.0], [9.0]];

        let votes = committee.vote(x.view()).unwrap();
        assert_eq!(votes, array![[1, 1], [1, -1], [-1, -1]]);
        assert_eq!(committee.names(), vec!["loose", "strict"]);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let x = array![[0.0], [2.0], [4.0], [6.0]];
        let build = || {
            Committee::new(vec![("a", threshold(1.0)), ("b", threshold(3.0)), ("c", threshold(5.0))])
                .unwrap()
        };
        let parallel = build().vote(x.view()).unwrap();
        let sequential = build().with_parallel(false).vote(x.view()).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_score_samples_matrix() {
        let committee = Committee::new(vec![("a", threshold(1.0)), ("b", threshold(2.0))]).unwrap();
        let scores = committee.score_samples(array![[1.0], [2.0]].view()).unwrap();
        assert_eq!(scores, array![[-1.0, -1.0], [-2.0, -2.0]]);
    }

    #[test]
    fn test_empty_committee_rejected() {
        let learners: Vec<(String, Box<dyn Learner>)> = Vec::new();
        assert!(matches!(
            Committee::new(learners),
            Err(ActiveError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Committee::new(vec![("a", threshold(1.0)), ("a", threshold(2.0))]).unwrap_err();
        assert!(err.to_string().contains("duplicate learner name 'a'"));
    }

    #[test]
    fn test_fit_failure_names_learner() {
        let failing: Box<dyn Learner> = Box::new(Threshold {
            limit: 0.0,
            fail_fit: true,
        });
        let mut committee = Committee::new(vec![("ok", threshold(1.0)), ("broken", failing)])
            .unwrap()
            .with_parallel(false);

        let err = committee.fit(array![[1.0]].view(), None).unwrap_err();
        match err {
            ActiveError::Model { learner, source } => {
                assert_eq!(learner, "broken");
                assert_eq!(source.to_string(), "fit exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_output_is_shape_mismatch() {
        let committee = Committee::new(vec![("short", Box::new(Short) as Box<dyn Learner>)]).unwrap();
        let err = committee.vote(array![[1.0], [2.0]].view()).unwrap_err();
        assert!(matches!(
            err,
            ActiveError::ShapeMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_get_by_name() {
        let committee = Committee::new(vec![("a", threshold(1.0))]).unwrap();
        assert!(committee.get("a").is_some());
        assert!(committee.get("z").is_none());
        assert_eq!(committee.len(), 1);
        assert!(!committee.is_empty());
    }
}
