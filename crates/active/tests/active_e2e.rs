//! End-to-end tests for active sampling
//!
//! Runs complete labeling workflows on synthetic series using only the
//! public API of this crate and the learner catalog.

use active::prelude::*;
use active::tags;
use catalog::{default_learners, ornstein_uhlenbeck, OrnsteinUhlenbeckConfig};
use ndarray::{s, Array1, Array2, Axis};

fn labeled_series(seed: u64) -> (Array2<f64>, Array1<f64>) {
    let config = OrnsteinUhlenbeckConfig::default().seed(seed);
    ornstein_uhlenbeck(600, 3, &config).unwrap()
}

#[test]
fn e2e_fit_calibrate_predict_query_workflow() {
    let (x, _) = labeled_series(314);
    let x_fit = x.slice(s![..300, ..]);
    let x_calib = x.slice(s![300..400, ..]);
    let pool = x.slice(s![400.., ..]);

    let mut sampler = ActiveSampler::new(default_learners()).unwrap();
    assert_eq!(sampler.phase(), SamplerPhase::Created);
    assert_eq!(sampler.learner_names(), vec!["zscore", "iqr"]);

    sampler
        .fit(FitData::new().train(x_fit).calibration(x_calib))
        .unwrap();
    assert_eq!(sampler.phase(), SamplerPhase::FittedAndCalibrated);

    let prediction = sampler.predict(pool, &[0.01, 0.1, 0.3]).unwrap();
    assert_eq!(prediction.n_samples(), 200);
    assert_eq!(prediction.n_learners(), 2);
    assert_eq!(prediction.n_alphas(), 3);

    // looser levels flag at least as many points per learner
    for learner in 0..2 {
        let counts: Vec<usize> = (0..3)
            .map(|i| prediction.anomaly_indices(i, learner).len())
            .collect();
        assert!(counts[0] <= counts[1] && counts[1] <= counts[2], "{counts:?}");
    }

    let strategy = QueryStrategy::conformal_fpr_uncertainty(&[0.01, 0.3]).unwrap();
    let picked = sampler.query(pool, 15, &strategy).unwrap();
    assert_eq!(picked.len(), 15);
    assert!(picked.iter().all(|&i| i < 200));
}

#[test]
fn e2e_calibration_only_workflow() {
    let (x, _) = labeled_series(7);
    let mut sampler = ActiveSampler::new(default_learners()).unwrap();

    sampler
        .fit(FitData::new().train(x.slice(s![..200, ..])))
        .unwrap();
    assert_eq!(sampler.phase(), SamplerPhase::Fitted);

    // calibrate later on fresh data, without refitting
    sampler
        .fit(FitData::new().calibration(x.slice(s![200..300, ..])))
        .unwrap();
    assert_eq!(sampler.phase(), SamplerPhase::FittedAndCalibrated);

    for detector in sampler.detectors() {
        let set = detector.calibration().unwrap();
        assert_eq!(set.len(), 100);
        let p_values = detector.p_values(x.slice(s![300.., ..])).unwrap();
        assert!(p_values.iter().all(|&p| p > 0.0 && p <= 1.0));
    }
}

#[test]
fn e2e_refit_requires_recalibration() {
    let (x, _) = labeled_series(11);
    let mut sampler = ActiveSampler::new(default_learners()).unwrap();
    sampler
        .fit(
            FitData::new()
                .train(x.slice(s![..200, ..]))
                .calibration(x.slice(s![200..300, ..])),
        )
        .unwrap();
    assert!(sampler.is_calibrated());

    sampler
        .fit(FitData::new().train(x.slice(s![100..400, ..])))
        .unwrap();
    assert_eq!(sampler.phase(), SamplerPhase::Fitted);

    let pool = x.slice(s![400.., ..]);
    assert!(matches!(
        sampler.query_by_tag(pool, 5, &[0.1, 0.2], tags::CONFORMAL_FPR_UNCERTAINTY),
        Err(ActiveError::NotCalibrated)
    ));
    assert_eq!(
        sampler
            .query_by_tag(pool, 5, &[], tags::MAX_DISAGREEMENT)
            .unwrap()
            .len(),
        5
    );
}

#[test]
fn e2e_random_queries_follow_random_state() {
    let (x, _) = labeled_series(3);
    let config = SamplerConfig::new().random_state(1234).parallel(false);

    let mut first = ActiveSampler::with_config(default_learners(), config.clone()).unwrap();
    let mut second = ActiveSampler::with_config(default_learners(), config).unwrap();
    let train = x.slice(s![..300, ..]);
    first.fit(FitData::new().train(train)).unwrap();
    second.fit(FitData::new().train(train)).unwrap();

    let pool = x.slice(s![300.., ..]);
    let a = first.query(pool, 20, &QueryStrategy::Random).unwrap();
    let b = second.query(pool, 20, &QueryStrategy::Random).unwrap();
    assert_eq!(a, b);
}

#[test]
fn e2e_labeling_loop_grows_training_set() {
    let (x, y) = labeled_series(21);
    let mut labeled: Vec<usize> = (0..150).collect();
    let mut pool: Vec<usize> = (150..450).collect();
    let x_calib = x.slice(s![450.., ..]);

    let mut sampler = ActiveSampler::new(default_learners()).unwrap();
    let strategy =
        QueryStrategy::from_tag(tags::CONFORMAL_FPR_UNCERTAINTY, &[0.05, 0.2]).unwrap();

    for _ in 0..3 {
        let x_train = x.select(Axis(0), &labeled);
        let y_train = y.select(Axis(0), &labeled);
        sampler
            .fit(
                FitData::new()
                    .train(x_train.view())
                    .labels(y_train.view())
                    .calibration(x_calib.view()),
            )
            .unwrap();

        let x_pool = x.select(Axis(0), &pool);
        let picked = sampler.query(x_pool.view(), 10, &strategy).unwrap();
        assert_eq!(picked.len(), 10);

        // move the queried rows from the pool to the labeled set
        let mut chosen: Vec<usize> = picked.iter().map(|&i| pool[i]).collect();
        chosen.sort_unstable();
        pool.retain(|i| chosen.binary_search(i).is_err());
        labeled.extend(chosen);
    }

    assert_eq!(labeled.len(), 180);
    assert_eq!(pool.len(), 270);
}
