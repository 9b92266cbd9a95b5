use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nest_core::{NestError, Point, PointLayout, RngHandle, RunProvenance};
use serde::Serialize;

use crate::posterior::PosteriorReservoir;
use crate::stack::LiveStack;

fn io_error(code: &str, err: impl ToString, path: &Path) -> NestError {
    NestError::io(code, err, path.display())
}

fn write_row(
    out: &mut impl Write,
    leading: &[f64],
    physical: &[f64],
    derived: &[f64],
) -> std::io::Result<()> {
    for value in leading.iter().chain(physical).chain(derived) {
        write!(out, "{value:>24.15e} ")?;
    }
    writeln!(out)
}

/// Rewrites the weighted posterior file: one `weight logL physical...
/// derived...` row per reservoir sample, weights normalized by the
/// running evidence.
pub fn write_posterior(
    path: &Path,
    reservoir: &PosteriorReservoir,
    log_z: f64,
) -> Result<(), NestError> {
    let file = File::create(path).map_err(|err| io_error("posterior-create", err, path))?;
    let mut out = BufWriter::new(file);
    for sample in reservoir.samples() {
        let weight = (sample.log_weight - log_z).exp();
        write_row(&mut out, &[weight, sample.logl], &sample.physical, &sample.derived)
            .map_err(|err| io_error("posterior-write", err, path))?;
    }
    out.flush().map_err(|err| io_error("posterior-flush", err, path))
}

/// Rewrites the equally-weighted posterior file by rejection against the
/// heaviest stored row.
pub fn write_equal_weights(
    path: &Path,
    reservoir: &PosteriorReservoir,
    rng: &mut RngHandle,
) -> Result<(), NestError> {
    let file = File::create(path).map_err(|err| io_error("equals-create", err, path))?;
    let mut out = BufWriter::new(file);
    for sample in reservoir.equal_weight_rows(rng) {
        write_row(&mut out, &[1.0, sample.logl], &sample.physical, &sample.derived)
            .map_err(|err| io_error("equals-write", err, path))?;
    }
    out.flush().map_err(|err| io_error("equals-flush", err, path))
}

/// Rewrites the snapshot of the current physical live points.
pub fn write_phys_live(path: &Path, stack: &LiveStack) -> Result<(), NestError> {
    let file = File::create(path).map_err(|err| io_error("live-create", err, path))?;
    let mut out = BufWriter::new(file);
    // logL goes last so the leading columns load as a parameter matrix.
    for point in stack.slots().iter().filter(|point| point.is_live()) {
        for value in point.physical.iter().chain(point.derived.iter()) {
            write!(out, "{value:>24.15e} ").map_err(|err| io_error("live-write", err, path))?;
        }
        writeln!(out, "{:>24.15e}", point.logl)
            .map_err(|err| io_error("live-write", err, path))?;
    }
    out.flush().map_err(|err| io_error("live-flush", err, path))
}

/// Append-only writer for the death stream.
///
/// Rows survive across resumes because the file is only ever appended;
/// a fresh (non-resumed) run truncates it once at startup.
pub struct DeadWriter {
    path: PathBuf,
}

impl DeadWriter {
    /// Creates the writer, truncating any previous stream unless the run
    /// is resuming.
    pub fn new(path: PathBuf, resuming: bool) -> Result<Self, NestError> {
        if !resuming {
            File::create(&path).map_err(|err| io_error("dead-create", err, &path))?;
        }
        Ok(Self { path })
    }

    /// Appends a batch of dead points.
    pub fn append(&mut self, rows: &[Point]) -> Result<(), NestError> {
        if rows.is_empty() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| io_error("dead-open", err, &self.path))?;
        let mut out = BufWriter::new(file);
        for point in rows {
            write_row(
                &mut out,
                &[point.logl, point.logl_birth],
                &point.physical,
                &point.derived,
            )
            .map_err(|err| io_error("dead-write", err, &self.path))?;
        }
        out.flush().map_err(|err| io_error("dead-flush", err, &self.path))
    }
}

/// Writes the parameter-name table: sampled parameters then derived ones.
pub fn write_paramnames(path: &Path, layout: PointLayout) -> Result<(), NestError> {
    let file = File::create(path).map_err(|err| io_error("paramnames-create", err, path))?;
    let mut out = BufWriter::new(file);
    for index in 1..=layout.ndims {
        writeln!(out, "p{index}    \\theta_{{{index}}}")
            .map_err(|err| io_error("paramnames-write", err, path))?;
    }
    for index in 1..=layout.nderived {
        writeln!(out, "d{index}*    \\phi_{{{index}}}")
            .map_err(|err| io_error("paramnames-write", err, path))?;
    }
    out.flush().map_err(|err| io_error("paramnames-flush", err, path))
}

/// Final run statistics payload (`.stats`).
#[derive(Debug, Clone, Serialize)]
pub struct StatsPayload {
    /// Provenance of the run.
    pub provenance: RunProvenance,
    /// Log-evidence point estimate.
    pub log_z: f64,
    /// Error bar on the log-evidence.
    pub log_z_err: f64,
    /// Deaths recorded.
    pub ndead: u64,
    /// Total likelihood calls charged to the run.
    pub total_likelihood_calls: u64,
    /// Mean likelihood calls per generation at termination.
    pub mean_likelihood_calls: f64,
    /// Posterior rows stored.
    pub nposterior: usize,
}

/// Writes the final summary.
pub fn write_stats(path: &Path, stats: &StatsPayload) -> Result<(), NestError> {
    let json = serde_json::to_string_pretty(stats)
        .map_err(|err| io_error("stats-serialize", err, path))?;
    std::fs::write(path, json).map_err(|err| io_error("stats-write", err, path))
}
