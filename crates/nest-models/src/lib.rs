#![deny(missing_docs)]

//! Concrete prior families and reference likelihoods for the nest engine.
//!
//! The engine is generic over the [`nest_core::PriorTransform`] and
//! [`nest_core::LogLikelihood`] seams; this crate provides the standard
//! block-composed priors and the analytic test problems used by the CLI
//! and the integration suite.

pub mod likelihoods;
pub mod priors;

pub use likelihoods::{Constant, GaussianShell, IsotropicGaussian, Rosenbrock};
pub use priors::{
    normal_quantile, CompositePrior, GaussianBlock, LogUniformBlock, PriorBlock, UniformBlock,
};
