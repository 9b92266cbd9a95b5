mod common;

use nest_core::NestError;
use nest_engine::{resume, run};
use tempfile::tempdir;

#[test]
fn run_writes_the_configured_file_surface() {
    let model = common::shell_model();
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 50, 63);
    config.num_repeats = 4;
    config.output.file_root = "shell".to_string();
    config.output.write_live = true;
    config.output.write_dead = true;
    config.output.write_paramnames = true;

    let summary = run(&config, model).unwrap();

    for name in [
        "shell.resume",
        "shell.txt",
        "shell_equal_weights.txt",
        "shell_phys_live.txt",
        "shell_dead.txt",
        "shell.stats",
        "shell.paramnames",
    ] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
    assert!(summary.nposterior > 0);
    assert!(summary.files.iter().any(|path| path.ends_with("shell.stats")));

    // Paramnames: two sampled parameters, one derived (starred).
    let names = std::fs::read_to_string(dir.path().join("shell.paramnames")).unwrap();
    let lines: Vec<&str> = names.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("p1"));
    assert!(lines[2].starts_with("d1*"));

    // The stats payload carries the summary numbers.
    let stats = std::fs::read_to_string(dir.path().join("shell.stats")).unwrap();
    assert!(stats.contains("\"log_z\""));
    assert!(stats.contains("\"ndead\""));
}

#[test]
fn live_snapshot_has_one_row_per_live_point() {
    let model = common::constant_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 25, 9);
    config.num_repeats = 4;
    config.max_ndead = 50;
    config.output.write_live = true;

    run(&config, model).unwrap();

    let live = std::fs::read_to_string(dir.path().join("run_phys_live.txt")).unwrap();
    // nlive live points remain, plus arrived daughters not yet promoted.
    let rows = live.lines().count();
    assert!(rows >= 25, "only {rows} live rows");
    assert!(rows <= 27, "{rows} live rows exceed the in-flight bound");
}

#[test]
fn too_many_workers_is_a_fatal_config_error() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 4, 1);
    config.workers = 8;

    let err = run(&config, model).unwrap_err();
    assert!(matches!(err, NestError::Config(_)));
    assert_eq!(err.info().code, "workers-exceed-nlive");
}

#[test]
fn zero_nlive_and_bad_precision_are_rejected() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();

    let mut config = common::quiet_config(dir.path(), 0, 1);
    assert!(matches!(
        run(&config, model.clone()),
        Err(NestError::Config(_))
    ));

    config.nlive = 10;
    config.precision_criterion = 0.0;
    assert!(matches!(run(&config, model), Err(NestError::Config(_))));
}

#[test]
fn resume_without_a_checkpoint_is_a_resume_error() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let config = common::quiet_config(dir.path(), 10, 1);
    let err = resume(&config, model).unwrap_err();
    assert!(matches!(err, NestError::Resume(_)));
    assert_eq!(err.info().code, "resume-missing");
}

#[test]
fn clustering_flags_are_accepted_but_inert() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 30, 4);
    config.num_repeats = 4;
    config.max_ndead = 60;
    config.do_clustering = true;
    config.cluster_posteriors = true;

    let summary = run(&config, model).unwrap();
    assert_eq!(summary.ndead, 60);
}
