use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use nest_core::{ErrorInfo, NestError, Point, PointLayout, RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceState;
use crate::posterior::PosteriorSample;

/// Schema carried by every checkpoint this engine writes.
pub const RESUME_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Serializable snapshot of the full sampler state.
///
/// Gestating reservations are persisted as-is and cancelled on load, so
/// resuming never observes half-finished in-flight work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Schema of this payload.
    pub schema_version: SchemaVersion,
    /// Provenance of the run that wrote the checkpoint.
    pub provenance: RunProvenance,
    /// Point layout of the stack slots.
    pub layout: PointLayout,
    /// Target live population size.
    pub nlive: usize,
    /// Every stack slot, blanks included.
    pub points: Vec<Point>,
    /// Evidence accumulator, death count included.
    pub evidence: EvidenceState,
    /// Seed-generation attempts so far; keys the deterministic substreams.
    pub task_counter: u64,
    /// Exponential moving average of likelihood calls per generation.
    pub mean_likelihood_calls: f64,
    /// Total likelihood calls charged to the run.
    pub total_likelihood_calls: u64,
    /// Posterior reservoir rows.
    pub posterior: Vec<PosteriorSample>,
}

impl ResumePayload {
    /// Restores a payload from disk, checking schema compatibility.
    pub fn load(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| NestError::io("resume-read", err, path.display()))?;
        let payload: ResumePayload = serde_json::from_str(&contents).map_err(|err| {
            NestError::Resume(
                ErrorInfo::new("resume-parse", err.to_string())
                    .with_context("path", path.display().to_string())
                    .with_hint("delete the resume file or disable read_resume"),
            )
        })?;
        if !payload.schema_version.compatible_with(RESUME_SCHEMA) {
            return Err(NestError::Resume(
                ErrorInfo::new("resume-schema", "checkpoint written by an incompatible engine")
                    .with_context("found", format_version(payload.schema_version))
                    .with_context("expected", format_version(RESUME_SCHEMA))
                    .with_hint("delete the resume file or disable read_resume"),
            ));
        }
        Ok(payload)
    }

    /// Writes the payload atomically: temp file in the destination
    /// directory, fsync, rename.
    pub fn store(&self, path: &Path) -> Result<(), NestError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| NestError::io("resume-mkdir", err, parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            NestError::Resume(
                ErrorInfo::new("resume-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let tmp = path.with_extension("resume.tmp");
        {
            let mut file = File::create(&tmp)
                .map_err(|err| NestError::io("resume-create", err, tmp.display()))?;
            file.write_all(json.as_bytes())
                .map_err(|err| NestError::io("resume-write", err, tmp.display()))?;
            file.sync_all()
                .map_err(|err| NestError::io("resume-sync", err, tmp.display()))?;
        }
        fs::rename(&tmp, path)
            .map_err(|err| NestError::io("resume-rename", err, path.display()))
    }
}

fn format_version(version: SchemaVersion) -> String {
    format!("{}.{}.{}", version.major, version.minor, version.patch)
}
