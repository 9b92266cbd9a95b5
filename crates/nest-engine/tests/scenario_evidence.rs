mod common;

use nest_engine::run;
use nest_models::{GaussianShell, IsotropicGaussian};
use tempfile::tempdir;

#[test]
fn constant_likelihood_recovers_zero_evidence() {
    // L = 1 on the unit square: log Z = 0 exactly.
    let model = common::constant_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 100, 1234);
    config.num_repeats = 4;
    config.precision_criterion = 1e-3;

    let summary = run(&config, model).unwrap();
    assert!(
        summary.log_z.abs() < 0.1,
        "log Z = {} should vanish",
        summary.log_z
    );
}

#[test]
fn gaussian_evidence_matches_the_analytic_value() {
    let model = common::gaussian_model(5);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 500, 42);
    config.num_repeats = 10;

    let summary = run(&config, model).unwrap();
    let expected = IsotropicGaussian::new(1.0).analytic_log_evidence(5, -10.0, 10.0);
    let tolerance = 3.0 * summary.log_z_err.max(0.1);
    assert!(
        (summary.log_z - expected).abs() < tolerance,
        "log Z = {} +/- {}, expected {expected}",
        summary.log_z,
        summary.log_z_err
    );
    assert!(summary.log_z_err < 0.5);
}

#[test]
fn gaussian_shell_evidence_and_posterior_concentrate_on_the_shell() {
    let model = common::shell_model();
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 500, 314);
    config.num_repeats = 8;

    let summary = run(&config, model).unwrap();
    let expected = GaussianShell::new(2.0, 0.1).analytic_log_evidence_2d(-6.0, 6.0);
    let tolerance = 3.0 * summary.log_z_err.max(0.1);
    assert!(
        (summary.log_z - expected).abs() < tolerance,
        "log Z = {} +/- {}, expected {expected}",
        summary.log_z,
        summary.log_z_err
    );

    // The derived radius column of the posterior file concentrates at 2.
    let posterior = std::fs::read_to_string(dir.path().join("run.txt")).unwrap();
    let mut weighted_radius = 0.0;
    let mut total_weight = 0.0;
    for line in posterior.lines() {
        let fields: Vec<f64> = line
            .split_whitespace()
            .map(|field| field.parse().unwrap())
            .collect();
        // weight, logL, x, y, radius
        assert_eq!(fields.len(), 5);
        weighted_radius += fields[0] * fields[4];
        total_weight += fields[0];
    }
    assert!(total_weight > 0.0);
    let mean_radius = weighted_radius / total_weight;
    assert!(
        (mean_radius - 2.0).abs() < 0.1,
        "posterior mean radius {mean_radius}"
    );
}

#[test]
fn rosenbrock_terminates_on_the_death_budget() {
    let model = common::rosenbrock_model(4);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 200, 2718);
    config.num_repeats = 8;
    config.max_ndead = 3000;
    config.precision_criterion = 1e-9;

    let summary = run(&config, model).unwrap();
    assert_eq!(summary.ndead, 3000);
    assert!(summary.log_z.is_finite());
}

#[test]
fn posterior_weight_law_holds_at_termination() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 200, 11);
    config.num_repeats = 6;
    config.posterior.nmax = 100_000;
    config.posterior.minimum_weight = 1e-300;

    let summary = run(&config, model).unwrap();
    // With an effectively unbounded reservoir and threshold, the stored
    // normalized weights account for all but the truncated live mass.
    let posterior = std::fs::read_to_string(dir.path().join("run.txt")).unwrap();
    let mass: f64 = posterior
        .lines()
        .map(|line| {
            line.split_whitespace()
                .next()
                .unwrap()
                .parse::<f64>()
                .unwrap()
        })
        .sum();
    assert!(
        (mass - 1.0).abs() < 0.05,
        "normalized posterior mass = {mass} (ndead = {})",
        summary.ndead
    );
}
