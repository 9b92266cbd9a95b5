#![deny(missing_docs)]

//! Parallel nested sampling engine.
//!
//! A master/worker pipeline maintains a population of live points inside
//! a shrinking likelihood contour, farms constrained-prior sampling out
//! to workers, reinserts results in the order the sequential algorithm
//! would have produced, accumulates the log-evidence with Keeton
//! quadrature, keeps a bounded posterior reservoir, and checkpoints the
//! whole state atomically. Entry points are [`run`] and [`resume`].

/// Atomic checkpoint payloads and their schema.
pub mod checkpoint;
/// Run configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation for every substream.
pub mod determinism;
/// Keeton log-evidence accumulator.
pub mod evidence;
/// Progress reporting and warning surface.
pub mod feedback;
/// Core master loop and public `run`/`resume` entry points.
pub mod kernel;
/// Model evaluator pairing prior transform and likelihood.
pub mod model;
/// Output file writers for the run directory surface.
pub mod output;
/// Bounded weighted posterior reservoir.
pub mod posterior;
/// Master/worker transport and seed generation.
pub mod scheduler;
/// Within-contour sampler implementations.
pub mod slice;
/// Live-point stack arena.
pub mod stack;

pub use config::{OutputConfig, PosteriorConfig, RunConfig, SamplerPolicy, SeedPolicy};
pub use evidence::EvidenceState;
pub use kernel::{resume, run, RunSummary};
pub use model::Model;
pub use posterior::{PosteriorReservoir, PosteriorSample};
pub use stack::LiveStack;
