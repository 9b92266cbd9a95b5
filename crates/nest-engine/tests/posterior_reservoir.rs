use nest_core::{Point, PointLayout, RngHandle};
use nest_engine::{PosteriorReservoir, PosteriorSample};

fn dead_point(logl: f64) -> Point {
    let mut point = Point::blank(PointLayout::new(2, 0));
    point.logl = logl;
    point.physical = vec![logl, -logl];
    point
}

#[test]
fn light_samples_are_rejected_outright() {
    let mut reservoir = PosteriorReservoir::new(8, 1e-6);
    // log_weight = -40 against log_z = 0 is far below the threshold.
    assert!(!reservoir.offer(&dead_point(-20.0), -20.0, 0.0));
    assert!(reservoir.is_empty());
}

#[test]
fn reservoir_grows_then_evicts_the_lightest_row() {
    let mut reservoir = PosteriorReservoir::new(3, 1e-30);
    assert!(reservoir.offer(&dead_point(-3.0), 0.0, 0.0));
    assert!(reservoir.offer(&dead_point(-2.0), 0.0, 0.0));
    assert!(reservoir.offer(&dead_point(-1.0), 0.0, 0.0));
    assert_eq!(reservoir.len(), 3);

    // Full: a heavier sample replaces the lightest stored row.
    assert!(reservoir.offer(&dead_point(-0.5), 0.0, 0.0));
    assert_eq!(reservoir.len(), 3);
    let weights: Vec<f64> = reservoir
        .samples()
        .iter()
        .map(|sample| sample.log_weight)
        .collect();
    assert!(weights.iter().all(|&w| w > -3.0));

    // Full: a lighter sample than every stored row is dropped.
    assert!(!reservoir.offer(&dead_point(-5.0), 0.0, 0.0));
    assert_eq!(reservoir.len(), 3);
}

#[test]
fn stale_rows_are_recycled_before_the_store_grows() {
    let mut reservoir = PosteriorReservoir::new(10, 1e-3);
    // Accepted against the early evidence level.
    assert!(reservoir.offer(&dead_point(-8.0), 0.0, -10.0));
    // As the evidence grows the stored row falls below the threshold and
    // is recycled in place instead of the store growing.
    assert!(reservoir.offer(&dead_point(-1.0), 0.0, 0.0));
    assert_eq!(reservoir.len(), 1);
    assert!((reservoir.samples()[0].log_weight - (-1.0)).abs() < 1e-15);
}

#[test]
fn normalized_mass_approaches_unity_for_a_complete_stream() {
    // Feed a geometric weight stream whose total mass is known, with a
    // reservoir large enough to keep everything.
    let mut reservoir = PosteriorReservoir::new(4096, 1e-300);
    let mut total = 0.0f64;
    for k in 0..2000 {
        let log_w = -0.01 * k as f64;
        total += log_w.exp();
        reservoir.offer(&dead_point(0.0), log_w, total.ln());
    }
    let mass = reservoir.normalized_mass(total.ln());
    assert!((mass - 1.0).abs() < 0.05, "mass = {mass}");
}

#[test]
fn equal_weight_rows_respect_the_weight_law() {
    let mut reservoir = PosteriorReservoir::new(4096, 1e-300);
    // Half the rows carry weight 1, half carry weight exp(-2).
    for k in 0..2000 {
        let log_w = if k % 2 == 0 { 0.0 } else { -2.0 };
        reservoir.offer(&dead_point(0.0), log_w, 0.0);
    }
    let mut rng = RngHandle::from_seed(17);
    let rows = reservoir.equal_weight_rows(&mut rng);
    let heavy = 1000.0;
    let light_expected = 1000.0 * (-2.0f64).exp();
    let light = rows.len() as f64 - heavy;
    // All heavy rows survive; light rows thin to ~exp(-2).
    assert!(rows.len() >= 1000);
    assert!(
        (light - light_expected).abs() < 60.0,
        "light rows: {light} vs {light_expected}"
    );
}

#[test]
fn checkpointed_rows_rebuild_the_reservoir() {
    let rows = vec![PosteriorSample {
        log_weight: -1.0,
        logl: -1.0,
        physical: vec![0.5],
        derived: vec![],
    }];
    let reservoir = PosteriorReservoir::from_samples(rows.clone(), 16, 1e-30);
    assert_eq!(reservoir.len(), 1);
    assert_eq!(reservoir.samples(), rows.as_slice());
}
