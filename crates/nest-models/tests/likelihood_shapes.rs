use nest_core::LogLikelihood;
use nest_models::{Constant, GaussianShell, IsotropicGaussian, Rosenbrock};

#[test]
fn constant_likelihood_is_flat() {
    let like = Constant;
    let mut derived = Vec::new();
    assert_eq!(like.log_likelihood(&[0.3, 0.7], &mut derived), 0.0);
    assert_eq!(like.log_likelihood(&[-100.0], &mut derived), 0.0);
}

#[test]
fn gaussian_peaks_at_the_origin_and_decays_radially() {
    let like = IsotropicGaussian::new(1.0);
    let mut derived = Vec::new();
    let at_origin = like.log_likelihood(&[0.0; 5], &mut derived);
    let off_origin = like.log_likelihood(&[1.0, 0.0, 0.0, 0.0, 0.0], &mut derived);
    assert_eq!(at_origin, 0.0);
    assert!((off_origin + 0.5).abs() < 1e-15);
}

#[test]
fn gaussian_analytic_evidence_matches_closed_form() {
    let like = IsotropicGaussian::new(1.0);
    let expected = 5.0 * ((2.0 * std::f64::consts::PI).sqrt() / 20.0).ln();
    assert!((like.analytic_log_evidence(5, -10.0, 10.0) - expected).abs() < 1e-12);
}

#[test]
fn shell_peaks_on_its_radius_and_reports_it_as_derived() {
    let like = GaussianShell::new(2.0, 0.1);
    let mut derived = vec![0.0];
    let on_shell = like.log_likelihood(&[2.0, 0.0], &mut derived);
    assert_eq!(on_shell, 0.0);
    assert!((derived[0] - 2.0).abs() < 1e-15);
    let off_shell = like.log_likelihood(&[3.0, 0.0], &mut derived);
    assert!(off_shell < -40.0);
    assert!((derived[0] - 3.0).abs() < 1e-15);
}

#[test]
fn rosenbrock_is_maximised_on_the_unit_diagonal() {
    let like = Rosenbrock;
    let mut derived = Vec::new();
    assert_eq!(like.log_likelihood(&[1.0; 4], &mut derived), 0.0);
    assert!(like.log_likelihood(&[0.9, 0.9, 0.9, 0.9], &mut derived) < 0.0);
}
