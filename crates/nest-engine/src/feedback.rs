use crate::config::RunConfig;

/// Progress reporting and warning surface, gated by the feedback level.
///
/// Level 0 is silent, level 1 reports a preamble, periodic progress and
/// the final summary, level 2 and above add stall diagnostics.
#[derive(Debug)]
pub struct Feedback {
    level: i32,
    last_stall_ndead: Option<u64>,
}

impl Feedback {
    /// Creates the reporter at the configured level.
    pub fn new(level: i32) -> Self {
        Self {
            level,
            last_stall_ndead: None,
        }
    }

    /// Announces the run configuration before sampling starts.
    pub fn preamble(&self, config: &RunConfig, ndims: usize, nderived: usize, resumed: bool) {
        if self.level < 1 {
            return;
        }
        println!("nest: nested sampling over {ndims} dimensions ({nderived} derived)");
        println!(
            "nest: nlive={} num_repeats={} workers={} precision={:.1e}",
            config.nlive,
            config.resolved_num_repeats(ndims),
            config.workers,
            config.precision_criterion,
        );
        if resumed {
            println!("nest: resuming from checkpoint");
        }
        if config.do_clustering || config.cluster_posteriors {
            println!("nest: warning: clustering options are accepted but not performed");
        }
    }

    /// Periodic progress line, emitted every `nlive` promotions.
    pub fn progress(&self, ndead: u64, mean_likelihood_calls: f64, log_z: f64, log_z_err: f64) {
        if self.level < 1 {
            return;
        }
        println!(
            "nest: ndead={ndead:>8} <nlike>={mean_likelihood_calls:>8.1} \
             logZ={log_z:>12.5} +/- {log_z_err:.5}"
        );
    }

    /// Stall warning, reported once per death-count transition.
    pub fn stall(&mut self, ndead: u64) {
        if self.last_stall_ndead == Some(ndead) {
            return;
        }
        self.last_stall_ndead = Some(ndead);
        if self.level >= 1 {
            eprintln!(
                "nest: warning: no valid seed at ndead={ndead}; \
                 too many workers for nlive, retrying"
            );
        }
    }

    /// Contained per-iteration failure (sampler or output write).
    pub fn contained_error(&self, context: &str, message: &str) {
        if self.level >= 1 {
            eprintln!("nest: warning: {context}: {message}");
        }
    }

    /// Final summary after termination.
    pub fn summary(
        &self,
        ndead: u64,
        total_likelihood_calls: u64,
        log_z: f64,
        log_z_err: f64,
        nposterior: usize,
    ) {
        if self.level < 1 {
            return;
        }
        println!("nest: finished: ndead={ndead} nlike={total_likelihood_calls}");
        println!("nest: logZ = {log_z:.6} +/- {log_z_err:.6} ({nposterior} posterior samples)");
    }
}
