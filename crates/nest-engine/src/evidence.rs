use nest_core::point::log_value;
use serde::{Deserialize, Serialize};

/// Adds two log-space values.
pub fn logsumexp2(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let hi = a.max(b);
    hi + ((a - hi).exp() + (b - hi).exp()).ln()
}

/// Adds three log-space values.
pub fn logsumexp3(a: f64, b: f64, c: f64) -> f64 {
    logsumexp2(logsumexp2(a, b), c)
}

/// Log-space mean of a sequence of log values.
pub fn log_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut total = f64::NEG_INFINITY;
    let mut count = 0usize;
    for value in values {
        total = logsumexp2(total, value);
        count += 1;
    }
    if count == 0 {
        f64::NEG_INFINITY
    } else {
        total - (count as f64).ln()
    }
}

/// Running evidence accumulator.
///
/// Maintains the six log-space moments of the Keeton quadrature:
/// `E[Z]`, `E[Z^2]`, `E[Z X]`, `E[X]`, `E[X^2]`, and the mean live
/// likelihood used for the termination bound. Each death consumes the
/// dead point's log-likelihood together with the live population size at
/// the time of death; the per-step shrinkage moments are
/// `E[t] = n/(n+1)` and `E[t^2] = n/(n+2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceState {
    /// `log E[Z]`.
    #[serde(with = "log_value")]
    pub log_z: f64,
    /// `log E[Z^2]`.
    #[serde(with = "log_value")]
    pub log_z2: f64,
    /// `log E[Z X]`.
    #[serde(with = "log_value")]
    pub log_zx: f64,
    /// `log E[X]`, the remaining prior volume.
    pub log_x: f64,
    /// `log E[X^2]`.
    pub log_x2: f64,
    /// Mean live log-likelihood, refreshed at every promotion.
    #[serde(with = "log_value")]
    pub log_mean_l_live: f64,
    /// Number of deaths recorded so far.
    pub ndead: u64,
}

impl EvidenceState {
    /// Fresh accumulator: zero evidence, unit prior volume.
    pub fn new() -> Self {
        Self {
            log_z: f64::NEG_INFINITY,
            log_z2: f64::NEG_INFINITY,
            log_zx: f64::NEG_INFINITY,
            log_x: 0.0,
            log_x2: 0.0,
            log_mean_l_live: f64::NEG_INFINITY,
            ndead: 0,
        }
    }

    /// Records one death with `nlive` live points present.
    ///
    /// Returns the dead point's raw log-weight `log w` (prior-volume
    /// element), to be combined with its likelihood for the posterior
    /// reservoir.
    pub fn record_death(&mut self, logl_dead: f64, nlive: usize) -> f64 {
        let n = nlive as f64;
        let log_np1 = (n + 1.0).ln();
        let log_np2 = (n + 2.0).ln();
        let log_t = n.ln() - log_np1;
        let log_t2 = n.ln() - log_np2;
        let log_w = self.log_x - log_np1;

        let log_z = logsumexp2(self.log_z, logl_dead + log_w);
        let log_z2 = logsumexp3(
            self.log_z2,
            logl_dead + self.log_zx + std::f64::consts::LN_2 - log_np1,
            2.0 * logl_dead + self.log_x2 + std::f64::consts::LN_2 - log_np1 - log_np2,
        );
        let log_zx = logsumexp2(
            self.log_zx + log_t,
            logl_dead + self.log_x2 + n.ln() - log_np1 - log_np2,
        );

        self.log_z = log_z;
        self.log_z2 = log_z2;
        self.log_zx = log_zx;
        self.log_x += log_t;
        self.log_x2 += log_t2;
        self.ndead += 1;
        log_w
    }

    /// Refreshes the mean live log-likelihood from the current live set.
    pub fn refresh_live(&mut self, live_logls: impl Iterator<Item = f64>) {
        self.log_mean_l_live = log_mean(live_logls);
    }

    /// Point estimate of the log-evidence.
    pub fn log_z(&self) -> f64 {
        self.log_z
    }

    /// Error bar on the log-evidence, `sqrt(log E[Z^2] - 2 log E[Z])`.
    pub fn log_z_err(&self) -> f64 {
        if self.log_z == f64::NEG_INFINITY {
            return f64::INFINITY;
        }
        (self.log_z2 - 2.0 * self.log_z).max(0.0).sqrt()
    }

    /// Upper-bound contribution of the remaining live set.
    pub fn log_z_live(&self) -> f64 {
        self.log_mean_l_live + self.log_x
    }

    /// True once the live contribution falls below `precision_criterion`
    /// relative to the accumulated evidence.
    pub fn is_converged(&self, precision_criterion: f64) -> bool {
        if self.log_z == f64::NEG_INFINITY {
            return false;
        }
        self.log_z_live() - self.log_z < precision_criterion.ln()
    }
}

impl Default for EvidenceState {
    fn default() -> Self {
        Self::new()
    }
}
