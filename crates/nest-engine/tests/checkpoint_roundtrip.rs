mod common;

use nest_core::PointEvaluator;
use nest_engine::checkpoint::{ResumePayload, RESUME_SCHEMA};
use nest_engine::scheduler::{generate_seed, SeedOutcome};
use nest_engine::{resume, run, EvidenceState, LiveStack};
use tempfile::tempdir;

#[test]
fn payload_roundtrips_through_disk() {
    let model = common::gaussian_model(3);
    let mut stack = LiveStack::new(model.layout(), 8, 16);
    stack.generate_initial(model.as_ref(), 5).unwrap();
    let SeedOutcome::Ready(_) = generate_seed(&mut stack, 5, 0) else {
        panic!("fresh stack must always produce a seed");
    };
    let mut evidence = EvidenceState::new();
    evidence.record_death(-4.0, 8);
    evidence.refresh_live(stack.live_logls());

    let payload = ResumePayload {
        schema_version: RESUME_SCHEMA,
        provenance: Default::default(),
        layout: model.layout(),
        nlive: 8,
        points: stack.slots().to_vec(),
        evidence: evidence.clone(),
        task_counter: 1,
        mean_likelihood_calls: 12.5,
        total_likelihood_calls: 90,
        posterior: Vec::new(),
    };

    let dir = tempdir().unwrap();
    let path = dir.path().join("test.resume");
    payload.store(&path).unwrap();
    let loaded = ResumePayload::load(&path).unwrap();

    assert_eq!(loaded.points, payload.points);
    assert_eq!(loaded.evidence, evidence);
    assert_eq!(loaded.task_counter, 1);
    assert_eq!(loaded.total_likelihood_calls, 90);
    // No stray temp file once the rename lands.
    assert!(!path.with_extension("resume.tmp").exists());
}

#[test]
fn malformed_checkpoints_are_resume_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.resume");
    std::fs::write(&path, "not a checkpoint").unwrap();
    let err = ResumePayload::load(&path).unwrap_err();
    assert_eq!(err.info().code, "resume-parse");
}

#[test]
fn interrupted_and_uninterrupted_runs_agree() {
    let model = common::gaussian_model(2);

    // Reference: one uninterrupted run.
    let dir_full = tempdir().unwrap();
    let mut config_full = common::quiet_config(dir_full.path(), 40, 99);
    config_full.num_repeats = 4;
    let full = run(&config_full, model.clone()).unwrap();

    // Interrupted: stop early on max_ndead, then resume to completion.
    let dir_split = tempdir().unwrap();
    let mut config_split = common::quiet_config(dir_split.path(), 40, 99);
    config_split.num_repeats = 4;
    config_split.max_ndead = 300;
    let partial = run(&config_split, model.clone()).unwrap();
    assert_eq!(partial.ndead, 300);

    config_split.max_ndead = 0;
    let resumed = resume(&config_split, model).unwrap();

    assert!(resumed.resumed);
    assert_eq!(resumed.ndead, full.ndead);
    assert_eq!(resumed.log_z, full.log_z);
    assert_eq!(resumed.total_likelihood_calls, full.total_likelihood_calls);
}

#[test]
fn read_resume_flag_continues_automatically() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 30, 7);
    config.num_repeats = 4;
    config.max_ndead = 100;
    let partial = run(&config, model.clone()).unwrap();
    assert!(!partial.resumed);

    config.max_ndead = 200;
    config.output.read_resume = true;
    let continued = run(&config, model).unwrap();
    assert!(continued.resumed);
    assert_eq!(continued.ndead, 200);
}
