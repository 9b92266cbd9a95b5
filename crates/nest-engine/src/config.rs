use std::path::PathBuf;

use nest_core::{ErrorInfo, NestError};
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing a sampling run.
///
/// Carries every knob of the binding-level entry point plus the engine's
/// ambient settings (worker count, seeding, reservoir sizing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Target live population size.
    pub nlive: usize,
    /// Slice-sampling directions per generated point (0 selects 5 per
    /// dimension at model-binding time).
    #[serde(default)]
    pub num_repeats: usize,
    /// Stop once the live contribution falls below this fraction of the
    /// accumulated evidence.
    #[serde(default = "default_precision_criterion")]
    pub precision_criterion: f64,
    /// Hard cap on recorded deaths (0 means unbounded).
    #[serde(default)]
    pub max_ndead: usize,
    /// Verbosity of progress reporting (0 silences everything).
    #[serde(default = "default_feedback")]
    pub feedback: i32,
    /// Number of worker threads (0 runs the sampler inline on the master).
    #[serde(default)]
    pub workers: usize,
    /// Accepted for binding compatibility; contour clustering is not
    /// performed by this engine.
    #[serde(default)]
    pub do_clustering: bool,
    /// Accepted for binding compatibility alongside `do_clustering`.
    #[serde(default)]
    pub cluster_posteriors: bool,
    /// Within-contour sampling strategy.
    #[serde(default)]
    pub sampler: SamplerPolicy,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Posterior reservoir behaviour.
    #[serde(default)]
    pub posterior: PosteriorConfig,
    /// Output surface configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_precision_criterion() -> f64 {
    1e-3
}

fn default_feedback() -> i32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            nlive: 500,
            num_repeats: 0,
            precision_criterion: default_precision_criterion(),
            max_ndead: 0,
            feedback: default_feedback(),
            workers: 0,
            do_clustering: false,
            cluster_posteriors: false,
            sampler: SamplerPolicy::default(),
            seed_policy: SeedPolicy::default(),
            posterior: PosteriorConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validates the configuration against a model dimensionality.
    ///
    /// Fatal at startup: non-positive population, zero dimensions, more
    /// workers than live points, or a non-positive precision criterion.
    pub fn validate(&self, ndims: usize) -> Result<(), NestError> {
        if ndims == 0 {
            return Err(NestError::Config(ErrorInfo::new(
                "zero-dimensions",
                "the model must have at least one sampled dimension",
            )));
        }
        if self.nlive == 0 {
            return Err(NestError::Config(ErrorInfo::new(
                "zero-nlive",
                "nlive must be positive",
            )));
        }
        if self.workers > self.nlive {
            return Err(NestError::Config(
                ErrorInfo::new(
                    "workers-exceed-nlive",
                    "each worker needs a distinct live point to seed from",
                )
                .with_context("workers", self.workers.to_string())
                .with_context("nlive", self.nlive.to_string())
                .with_hint("reduce the worker count or raise nlive"),
            ));
        }
        if !(self.precision_criterion > 0.0) {
            return Err(NestError::Config(
                ErrorInfo::new(
                    "bad-precision",
                    "precision_criterion must be strictly positive",
                )
                .with_context("precision_criterion", self.precision_criterion.to_string()),
            ));
        }
        if !(self.posterior.minimum_weight > 0.0 && self.posterior.minimum_weight < 1.0) {
            return Err(NestError::Config(
                ErrorInfo::new("bad-minimum-weight", "minimum_weight must lie in (0, 1)")
                    .with_context(
                        "minimum_weight",
                        self.posterior.minimum_weight.to_string(),
                    ),
            ));
        }
        Ok(())
    }

    /// Directions per generated point after applying the per-dimension
    /// default.
    pub fn resolved_num_repeats(&self, ndims: usize) -> usize {
        if self.num_repeats == 0 {
            5 * ndims
        } else {
            self.num_repeats
        }
    }

    /// Backing-array capacity: at least twice the live population, grown
    /// with the chain length so in-flight generations always find slots.
    pub fn resolved_nstack(&self, ndims: usize) -> usize {
        let chain = self.resolved_num_repeats(ndims).div_ceil(4);
        self.nlive * chain.clamp(2, 8)
    }

    /// Posterior reservoir capacity after applying the boost factor.
    pub fn resolved_nmax_posterior(&self) -> usize {
        if self.posterior.nmax > 0 {
            self.posterior.nmax
        } else {
            let boost = self.posterior.boost.max(0.0);
            ((1.0 + boost) * self.nlive as f64).ceil() as usize * 4
        }
    }

    /// Promotions between checkpoint/output refreshes.
    pub fn resolved_update_interval(&self) -> usize {
        if self.output.update_files == 0 {
            self.nlive
        } else {
            self.output.update_files
        }
    }
}

/// Supported within-contour sampling strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SamplerPolicy {
    /// Slice sampling along random directions with chord adaptation.
    Slice,
    /// Uniform rejection from the whole hypercube (low dimensions only).
    Rejection {
        /// Draws before the task is abandoned as stalled.
        #[serde(default = "default_rejection_attempts")]
        max_attempts: usize,
    },
}

fn default_rejection_attempts() -> usize {
    1_000_000
}

impl Default for SamplerPolicy {
    fn default() -> Self {
        SamplerPolicy::Slice
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in provenance alongside the seed.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0xDEAD_BEEF_CAFE_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Posterior reservoir configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorConfig {
    /// Reservoir capacity (0 selects `4 * (1 + boost) * nlive`).
    #[serde(default)]
    pub nmax: usize,
    /// Capacity boost factor applied when `nmax` is 0.
    #[serde(default)]
    pub boost: f64,
    /// Samples lighter than this fraction of the evidence are not stored.
    #[serde(default = "default_minimum_weight")]
    pub minimum_weight: f64,
}

fn default_minimum_weight() -> f64 {
    1e-30
}

impl Default for PosteriorConfig {
    fn default() -> Self {
        Self {
            nmax: 0,
            boost: 0.0,
            minimum_weight: default_minimum_weight(),
        }
    }
}

/// Output surface configuration (spec'd filesystem layout under
/// `base_dir/file_root.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving every run artifact. Created if absent.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Stem shared by all output files.
    #[serde(default = "default_file_root")]
    pub file_root: String,
    /// Write the `.resume` checkpoint periodically.
    #[serde(default = "default_true")]
    pub write_resume: bool,
    /// Resume from an existing checkpoint when one is present.
    #[serde(default)]
    pub read_resume: bool,
    /// Write weighted posterior samples (`.txt`).
    #[serde(default = "default_true")]
    pub posteriors: bool,
    /// Write equally-weighted posterior samples (`_equal_weights.txt`).
    #[serde(default = "default_true")]
    pub equals: bool,
    /// Write the final summary (`.stats`).
    #[serde(default = "default_true")]
    pub write_stats: bool,
    /// Write the current physical live points (`_phys_live.txt`).
    #[serde(default)]
    pub write_live: bool,
    /// Write the death stream (`_dead.txt`).
    #[serde(default)]
    pub write_dead: bool,
    /// Write the parameter-name table (`.paramnames`).
    #[serde(default)]
    pub write_paramnames: bool,
    /// Promotions between file refreshes (0 selects `nlive`).
    #[serde(default)]
    pub update_files: usize,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("chains")
}

fn default_file_root() -> String {
    "run".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            file_root: default_file_root(),
            write_resume: true,
            read_resume: false,
            posteriors: true,
            equals: true,
            write_stats: true,
            write_live: false,
            write_dead: false,
            write_paramnames: false,
            update_files: 0,
        }
    }
}

impl OutputConfig {
    /// Path of an output file with the given suffix appended to the stem.
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", self.file_root, suffix))
    }
}
