//! Basic example of conformal committee active sampling
//!
//! Run with: cargo run --example basic -p active
//! Set RUST_LOG=active_core=debug for per-query logs.

use active::is_outlier;
use active::prelude::*;
use catalog::{default_learners, ornstein_uhlenbeck, OrnsteinUhlenbeckConfig};
use ndarray::s;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "active_core=info".into()),
        )
        .init();

    println!("=== active Basic Example ===\n");

    // Synthetic series with labeled anomaly bursts
    let (x, y) = ornstein_uhlenbeck(1_000, 3, &OrnsteinUhlenbeckConfig::default())?;
    let x_fit = x.slice(s![..500, ..]);
    let x_calib = x.slice(s![500..700, ..]);
    let x_pool = x.slice(s![700.., ..]);
    println!(
        "Series: {} rows x {} features, {} anomaly onsets",
        x.nrows(),
        x.ncols(),
        y.sum()
    );

    // 1. Fit and calibrate the committee
    let mut sampler = ActiveSampler::new(default_learners())?;
    sampler.fit(FitData::new().train(x_fit).calibration(x_calib))?;
    println!("Committee: {:?} ({:?})\n", sampler.learner_names(), sampler.phase());

    // 2. Raw votes and conformal decisions
    let alphas = [0.01, 0.05, 0.2];
    let prediction = sampler.predict(x_pool, &alphas)?;
    for (learner, name) in sampler.learner_names().iter().enumerate() {
        let votes = prediction
            .ads_results
            .column(learner)
            .iter()
            .filter(|&&v| is_outlier(v))
            .count();
        println!("{name}: {votes} outlier votes");
        for (i, alpha) in alphas.iter().enumerate() {
            let flagged = prediction.anomaly_indices(i, learner).len();
            println!("   alpha={alpha:<5} {flagged} conformal anomalies");
        }
    }

    // 3. Pick the points worth labeling
    println!();
    let strategies = [
        QueryStrategy::conformal_fpr_uncertainty(&[0.01, 0.2])?,
        QueryStrategy::MaxDisagreement,
        QueryStrategy::VoteEntropy,
        QueryStrategy::Random,
    ];
    for strategy in &strategies {
        let picked = sampler.query(x_pool, 5, strategy)?;
        let indices: Vec<usize> = picked.iter().map(|i| i + 700).collect();
        println!("{:28} {:?}", strategy.tag(), indices);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
