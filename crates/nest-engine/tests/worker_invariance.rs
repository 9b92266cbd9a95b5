mod common;

use nest_engine::run;
use tempfile::tempdir;

/// Serial mode and a single worker thread execute the identical logical
/// schedule: one task in flight, collected before the next promotion.
#[test]
fn one_worker_thread_reproduces_the_serial_run() {
    let model = common::gaussian_model(2);

    let dir_serial = tempdir().unwrap();
    let mut config_serial = common::quiet_config(dir_serial.path(), 60, 5150);
    config_serial.num_repeats = 4;
    config_serial.workers = 0;
    let serial = run(&config_serial, model.clone()).unwrap();

    let dir_threaded = tempdir().unwrap();
    let mut config_threaded = common::quiet_config(dir_threaded.path(), 60, 5150);
    config_threaded.num_repeats = 4;
    config_threaded.workers = 1;
    let threaded = run(&config_threaded, model).unwrap();

    assert_eq!(serial.ndead, threaded.ndead);
    assert!((serial.log_z - threaded.log_z).abs() < 1e-9);
}

/// More workers change the in-flight census but not the distribution;
/// the estimates must agree within their combined error bars.
#[test]
fn four_workers_agree_with_serial_within_error_bars() {
    let model = common::gaussian_model(3);

    let dir_serial = tempdir().unwrap();
    let mut config_serial = common::quiet_config(dir_serial.path(), 250, 808);
    config_serial.num_repeats = 6;
    let serial = run(&config_serial, model.clone()).unwrap();

    let dir_pool = tempdir().unwrap();
    let mut config_pool = common::quiet_config(dir_pool.path(), 250, 808);
    config_pool.num_repeats = 6;
    config_pool.workers = 4;
    let pooled = run(&config_pool, model).unwrap();

    let combined = (serial.log_z_err.powi(2) + pooled.log_z_err.powi(2)).sqrt();
    assert!(
        (serial.log_z - pooled.log_z).abs() < 4.0 * combined + 0.2,
        "serial {} +/- {} vs pooled {} +/- {}",
        serial.log_z,
        serial.log_z_err,
        pooled.log_z,
        pooled.log_z_err
    );
}

/// The dead stream is sorted: successive deaths never decrease in
/// likelihood, whatever the completion order of the workers.
#[test]
fn death_stream_is_monotone_under_parallel_completion() {
    let model = common::gaussian_model(2);
    let dir = tempdir().unwrap();
    let mut config = common::quiet_config(dir.path(), 80, 33);
    config.num_repeats = 4;
    config.workers = 3;
    config.output.write_dead = true;

    run(&config, model).unwrap();

    let dead = std::fs::read_to_string(dir.path().join("run_dead.txt")).unwrap();
    let mut previous = f64::NEG_INFINITY;
    let mut rows = 0;
    for line in dead.lines() {
        let logl: f64 = line.split_whitespace().next().unwrap().parse().unwrap();
        assert!(logl >= previous, "dead stream went backwards at row {rows}");
        previous = logl;
        rows += 1;
    }
    assert!(rows > 100);
}
