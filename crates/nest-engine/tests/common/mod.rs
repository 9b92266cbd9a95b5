use std::path::Path;
use std::sync::Arc;

use nest_engine::{Model, RunConfig};
use nest_models::{CompositePrior, Constant, GaussianShell, IsotropicGaussian, Rosenbrock};

pub fn constant_model(ndims: usize) -> Arc<Model> {
    let prior = CompositePrior::uniform(ndims, 0.0, 1.0).unwrap();
    Arc::new(Model::new(Box::new(prior), Box::new(Constant)).unwrap())
}

pub fn gaussian_model(ndims: usize) -> Arc<Model> {
    let prior = CompositePrior::uniform(ndims, -10.0, 10.0).unwrap();
    Arc::new(Model::new(Box::new(prior), Box::new(IsotropicGaussian::new(1.0))).unwrap())
}

pub fn shell_model() -> Arc<Model> {
    let prior = CompositePrior::uniform(2, -6.0, 6.0).unwrap();
    Arc::new(Model::new(Box::new(prior), Box::new(GaussianShell::new(2.0, 0.1))).unwrap())
}

pub fn rosenbrock_model(ndims: usize) -> Arc<Model> {
    let prior = CompositePrior::uniform(ndims, -5.0, 5.0).unwrap();
    Arc::new(Model::new(Box::new(prior), Box::new(Rosenbrock)).unwrap())
}

pub fn quiet_config(out_dir: &Path, nlive: usize, seed: u64) -> RunConfig {
    let mut config = RunConfig::default();
    config.nlive = nlive;
    config.feedback = 0;
    config.seed_policy.master_seed = seed;
    config.output.base_dir = out_dir.to_path_buf();
    config
}
