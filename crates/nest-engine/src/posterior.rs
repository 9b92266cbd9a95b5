use nest_core::point::log_value;
use nest_core::{Point, RngHandle};
use serde::{Deserialize, Serialize};

/// One weighted posterior row.
///
/// The weight is the raw `log L + log w` of the dead point; consumers
/// normalize by the final log-evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSample {
    /// Raw log-weight of the sample.
    #[serde(with = "log_value")]
    pub log_weight: f64,
    /// Log-likelihood of the sample.
    #[serde(with = "log_value")]
    pub logl: f64,
    /// Physical coordinates.
    pub physical: Vec<f64>,
    /// Derived quantities.
    pub derived: Vec<f64>,
}

/// Bounded weighted-sample store with minimum-weight eviction.
///
/// Deaths lighter than `minimum_weight` relative to the running evidence
/// are not stored. While the store has room it still prefers recycling a
/// row that has itself dropped below the threshold before growing, which
/// keeps the reservoir concentrated near high-weight samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorReservoir {
    samples: Vec<PosteriorSample>,
    capacity: usize,
    log_minimum_weight: f64,
}

impl PosteriorReservoir {
    /// Creates an empty reservoir.
    pub fn new(capacity: usize, minimum_weight: f64) -> Self {
        Self {
            samples: Vec::new(),
            capacity,
            log_minimum_weight: minimum_weight.ln(),
        }
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stored rows.
    pub fn samples(&self) -> &[PosteriorSample] {
        &self.samples
    }

    /// Offers a dead point with its raw log-weight element `log_w`,
    /// given the current running `log_z`.
    ///
    /// Returns true when the sample was stored.
    pub fn offer(&mut self, dead: &Point, log_w: f64, log_z: f64) -> bool {
        let log_weight = dead.logl + log_w;
        let threshold = self.log_minimum_weight + log_z;
        if log_weight <= threshold {
            return false;
        }
        let row = PosteriorSample {
            log_weight,
            logl: dead.logl,
            physical: dead.physical.clone(),
            derived: dead.derived.clone(),
        };
        if self.samples.len() < self.capacity {
            // Recycle a row that has fallen below the threshold before
            // growing the store.
            if let Some(stale) = self
                .samples
                .iter()
                .position(|sample| sample.log_weight < threshold)
            {
                self.samples[stale] = row;
            } else {
                self.samples.push(row);
            }
        } else {
            let Some(lightest) = self.argmin_weight() else {
                return false;
            };
            if self.samples[lightest].log_weight >= log_weight {
                return false;
            }
            self.samples[lightest] = row;
        }
        true
    }

    fn argmin_weight(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, sample) in self.samples.iter().enumerate() {
            match best {
                Some(current) if self.samples[current].log_weight <= sample.log_weight => {}
                _ => best = Some(index),
            }
        }
        best
    }

    /// Sum of normalized weights, `sum exp(log_weight - log_z)`.
    pub fn normalized_mass(&self, log_z: f64) -> f64 {
        self.samples
            .iter()
            .map(|sample| (sample.log_weight - log_z).exp())
            .sum()
    }

    /// Draws an equally-weighted subset by rejection against the heaviest
    /// stored row.
    pub fn equal_weight_rows(&self, rng: &mut RngHandle) -> Vec<&PosteriorSample> {
        let Some(max_log_weight) = self
            .samples
            .iter()
            .map(|sample| sample.log_weight)
            .fold(None, |best: Option<f64>, w| {
                Some(best.map_or(w, |b| b.max(w)))
            })
        else {
            return Vec::new();
        };
        self.samples
            .iter()
            .filter(|sample| rng.uniform() < (sample.log_weight - max_log_weight).exp())
            .collect()
    }

    /// Rebuilds a reservoir from checkpointed rows.
    pub fn from_samples(
        samples: Vec<PosteriorSample>,
        capacity: usize,
        minimum_weight: f64,
    ) -> Self {
        Self {
            samples,
            capacity,
            log_minimum_weight: minimum_weight.ln(),
        }
    }
}
