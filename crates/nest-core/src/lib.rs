#![deny(missing_docs)]

//! Core traits and data types for the nest sampling engine.
//!
//! The engine crate is generic over three seams defined here: the prior
//! transform from the unit hypercube to physical coordinates, the user
//! log-likelihood, and the within-contour sampler that produces a new
//! independent point above a likelihood bound.

pub mod errors;
pub mod point;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, NestError};
pub use point::{Point, PointLayout, SlotStatus};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};

/// Maps unit-hypercube coordinates to physical coordinates.
///
/// Must be bijective on its support and total on `[0,1]^ndims`; input
/// outside the unit cube (only possible under data corruption) surfaces
/// as a [`NestError::Prior`].
pub trait PriorTransform: Send + Sync {
    /// Number of sampled dimensions.
    fn ndims(&self) -> usize;

    /// Fills `physical` from `hypercube`. Both slices have `ndims` length.
    fn transform(&self, hypercube: &[f64], physical: &mut [f64]) -> Result<(), NestError>;
}

/// User log-likelihood callback.
///
/// Treated as a pure function of `(physical, derived_out)`; it writes the
/// derived quantities and returns the scalar log-likelihood. A failure is
/// signalled by returning NaN or `-inf`, which the evaluator contains by
/// treating the point as lowest possible.
pub trait LogLikelihood: Send + Sync {
    /// Number of derived quantities written per evaluation.
    fn nderived(&self) -> usize;

    /// Evaluates the log-likelihood at `physical`, writing `derived`.
    fn log_likelihood(&self, physical: &[f64], derived: &mut [f64]) -> f64;
}

/// Evaluates a point in place: prior transform, likelihood call, and
/// evaluation accounting. Implemented by the engine's model evaluator and
/// consumed by [`ContourSampler`] implementations.
pub trait PointEvaluator: Send + Sync {
    /// Layout of the point records this evaluator fills.
    fn layout(&self) -> PointLayout;

    /// Computes `physical`, `derived`, and `logl` from `hypercube`,
    /// incrementing the point's evaluation count.
    fn evaluate(&self, point: &mut Point) -> Result<(), NestError>;
}

/// Produces a new independent sample inside a likelihood contour.
///
/// Contract: given a seed with `seed.logl > seed.logl_birth`, returns a
/// point with `logl > seed.logl_birth` drawn (to the sampler's
/// approximation) from the prior restricted to the contour interior. The
/// returned point carries the bound in `logl_birth`, the evaluations
/// consumed in `nlike`, and an updated `last_chord` hint.
pub trait ContourSampler: Send {
    /// Generates the replacement point for `seed`.
    fn sample(
        &mut self,
        seed: &Point,
        evaluator: &dyn PointEvaluator,
        rng: &mut RngHandle,
    ) -> Result<Point, NestError>;
}
