//! Sample point record and slot lifecycle tags.

use serde::{Deserialize, Serialize};

/// Serde adapter for log-space values that may be `-inf`.
///
/// JSON has no representation for infinities; log-likelihoods and
/// log-volume accumulators legitimately start at `-inf`, so they are
/// persisted as `null` and restored to `-inf` on load.
pub mod log_value {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes finite values as numbers and `-inf` as `null`.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    /// Restores `null` to `-inf`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value: Option<f64> = Option::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::NEG_INFINITY))
    }
}

/// Dimensions of the point record: physical parameters and derived
/// quantities. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointLayout {
    /// Number of sampled dimensions (hypercube and physical widths).
    pub ndims: usize,
    /// Number of derived quantities written by the likelihood.
    pub nderived: usize,
}

impl PointLayout {
    /// Creates a layout descriptor.
    pub const fn new(ndims: usize, nderived: usize) -> Self {
        Self { ndims, nderived }
    }
}

/// Lifecycle tag of a stack slot.
///
/// Replaces the sentinel integer encoding of the reference scheme with an
/// explicit variant; the daughter link carries its slot index separately
/// from the three empty/reserved/live states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "slot", rename_all = "kebab-case")]
pub enum SlotStatus {
    /// Slot is empty and may be claimed.
    Blank,
    /// Slot is reserved; a worker is producing its point.
    Gestating,
    /// Live point with no daughter launched yet.
    Waiting,
    /// Live point whose replacement is being generated in the given slot.
    Daughter(usize),
}

impl SlotStatus {
    /// True for `Waiting` and `Daughter` slots.
    pub fn is_live(&self) -> bool {
        matches!(self, SlotStatus::Waiting | SlotStatus::Daughter(_))
    }

    /// Returns the daughter slot index if one has been launched.
    pub fn daughter(&self) -> Option<usize> {
        match self {
            SlotStatus::Daughter(slot) => Some(*slot),
            _ => None,
        }
    }
}

/// Fixed-layout numeric record for a single sample.
///
/// `logl_birth` is the likelihood contour under which the point was
/// generated (`-inf` for the initial population); `last_chord` is an
/// adaptive step-size hint carried between generations by the
/// within-contour sampler and persisted across checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Coordinates in the unit hypercube.
    pub hypercube: Vec<f64>,
    /// Coordinates after the prior transform.
    pub physical: Vec<f64>,
    /// Derived quantities produced by the likelihood.
    pub derived: Vec<f64>,
    /// Log-likelihood at this point.
    #[serde(with = "log_value")]
    pub logl: f64,
    /// Contour bound at which this point was generated.
    #[serde(with = "log_value")]
    pub logl_birth: f64,
    /// Likelihood evaluations consumed producing this point.
    pub nlike: u64,
    /// Adaptive chord-length hint for the within-contour sampler.
    pub last_chord: f64,
    /// Lifecycle tag and daughter link.
    pub status: SlotStatus,
}

impl Point {
    /// Creates an empty (blank) record for the given layout.
    pub fn blank(layout: PointLayout) -> Self {
        Self {
            hypercube: vec![0.0; layout.ndims],
            physical: vec![0.0; layout.ndims],
            derived: vec![0.0; layout.nderived],
            logl: f64::NEG_INFINITY,
            logl_birth: f64::NEG_INFINITY,
            nlike: 0,
            last_chord: 0.0,
            status: SlotStatus::Blank,
        }
    }

    /// Resets the record to the blank state, keeping its buffers.
    pub fn clear(&mut self) {
        self.hypercube.fill(0.0);
        self.physical.fill(0.0);
        self.derived.fill(0.0);
        self.logl = f64::NEG_INFINITY;
        self.logl_birth = f64::NEG_INFINITY;
        self.nlike = 0;
        self.last_chord = 0.0;
        self.status = SlotStatus::Blank;
    }

    /// True when the slot holds a live point.
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}
