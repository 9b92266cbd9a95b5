use nest_core::{
    ContourSampler, ErrorInfo, NestError, Point, PointEvaluator, RngHandle,
};

use crate::config::SamplerPolicy;

const MAX_STEP_OUT: usize = 16;
const MIN_INTERVAL: f64 = 1e-13;

/// Builds the configured within-contour sampler.
pub fn build_sampler(policy: &SamplerPolicy, num_repeats: usize) -> Box<dyn ContourSampler> {
    match policy {
        SamplerPolicy::Slice => Box::new(SliceSampler::new(num_repeats)),
        SamplerPolicy::Rejection { max_attempts } => {
            Box::new(RejectionSampler::new(*max_attempts))
        }
    }
}

/// Slice sampler along random unit directions inside the hypercube.
///
/// Each generation performs `num_repeats` one-dimensional slice updates:
/// place an interval of the current chord length around the seed, step
/// out while the endpoints stay inside the contour, then shrink onto an
/// accepted point. The mean accepted chord feeds the `last_chord` hint
/// carried to the next generation.
pub struct SliceSampler {
    num_repeats: usize,
}

impl SliceSampler {
    /// Creates the sampler with the given number of directions.
    pub fn new(num_repeats: usize) -> Self {
        Self {
            num_repeats: num_repeats.max(1),
        }
    }
}

impl ContourSampler for SliceSampler {
    fn sample(
        &mut self,
        seed: &Point,
        evaluator: &dyn PointEvaluator,
        rng: &mut RngHandle,
    ) -> Result<Point, NestError> {
        let layout = evaluator.layout();
        let ndims = layout.ndims;
        let bound = seed.logl_birth;
        let diagonal = (ndims as f64).sqrt();

        let mut current = seed.clone();
        current.nlike = 0;
        let mut chord = if current.last_chord > 0.0 && current.last_chord.is_finite() {
            current.last_chord.min(diagonal)
        } else {
            diagonal
        };

        let mut trial = Point::blank(layout);
        let mut direction = vec![0.0; ndims];
        let mut chord_sum = 0.0;
        let mut accepted = 0usize;

        for _ in 0..self.num_repeats {
            rng.unit_direction(&mut direction);
            let (cube_lo, cube_hi) = cube_extent(&current.hypercube, &direction);

            // Random placement of the initial interval around the seed.
            let mut lo = (-chord * rng.uniform()).max(cube_lo);
            let mut hi = (lo + chord).min(cube_hi);

            // Step out while the endpoints remain inside the contour.
            let mut expansions = 0;
            while lo > cube_lo && expansions < MAX_STEP_OUT {
                evaluate_offset(&mut trial, &current, &direction, lo, evaluator)?;
                if trial.logl <= bound {
                    break;
                }
                lo = (lo - chord).max(cube_lo);
                expansions += 1;
            }
            expansions = 0;
            while hi < cube_hi && expansions < MAX_STEP_OUT {
                evaluate_offset(&mut trial, &current, &direction, hi, evaluator)?;
                if trial.logl <= bound {
                    break;
                }
                hi = (hi + chord).min(cube_hi);
                expansions += 1;
            }

            // Shrink onto an accepted point.
            loop {
                if hi - lo < MIN_INTERVAL {
                    // Degenerate slice; the seed position still satisfies
                    // the bound, so keep it for this direction.
                    break;
                }
                let t = rng.uniform_in(lo, hi);
                evaluate_offset(&mut trial, &current, &direction, t, evaluator)?;
                // Ties at the bound are admitted (likelihood plateaus).
                if trial.logl >= bound {
                    chord_sum += hi - lo;
                    accepted += 1;
                    current.hypercube.copy_from_slice(&trial.hypercube);
                    current.physical.copy_from_slice(&trial.physical);
                    current.derived.copy_from_slice(&trial.derived);
                    current.logl = trial.logl;
                    break;
                }
                if t < 0.0 {
                    lo = t;
                } else {
                    hi = t;
                }
            }
            current.nlike += trial.nlike;
            trial.nlike = 0;
        }

        if accepted > 0 {
            chord = 0.5 * (chord + chord_sum / accepted as f64);
        }
        current.logl_birth = bound;
        current.last_chord = chord;
        Ok(current)
    }
}

/// Evaluates `base + t * direction`, clamped into the closed unit cube
/// against floating-point drift at the edges.
fn evaluate_offset(
    trial: &mut Point,
    base: &Point,
    direction: &[f64],
    t: f64,
    evaluator: &dyn PointEvaluator,
) -> Result<(), NestError> {
    for ((coord, &origin), &step) in trial
        .hypercube
        .iter_mut()
        .zip(base.hypercube.iter())
        .zip(direction.iter())
    {
        *coord = (origin + t * step).clamp(0.0, 1.0);
    }
    evaluator.evaluate(trial)
}

/// Range of offsets along `direction` keeping `base` inside `[0,1]^D`.
fn cube_extent(base: &[f64], direction: &[f64]) -> (f64, f64) {
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    for (&x, &u) in base.iter().zip(direction.iter()) {
        if u > 0.0 {
            lo = lo.max(-x / u);
            hi = hi.min((1.0 - x) / u);
        } else if u < 0.0 {
            lo = lo.max((1.0 - x) / u);
            hi = hi.min(-x / u);
        }
    }
    (lo.min(0.0), hi.max(0.0))
}

/// Brute-force sampler drawing uniformly from the whole hypercube until a
/// point clears the bound. Exact but exponentially expensive as the
/// contour shrinks; intended for low dimensions and cross-checks.
pub struct RejectionSampler {
    max_attempts: usize,
}

impl RejectionSampler {
    /// Creates the sampler with an attempt ceiling.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl ContourSampler for RejectionSampler {
    fn sample(
        &mut self,
        seed: &Point,
        evaluator: &dyn PointEvaluator,
        rng: &mut RngHandle,
    ) -> Result<Point, NestError> {
        let layout = evaluator.layout();
        let bound = seed.logl_birth;
        let mut trial = Point::blank(layout);
        for _ in 0..self.max_attempts {
            for coord in trial.hypercube.iter_mut() {
                *coord = rng.uniform();
            }
            evaluator.evaluate(&mut trial)?;
            if trial.logl >= bound {
                trial.logl_birth = bound;
                trial.last_chord = seed.last_chord;
                trial.status = seed.status;
                return Ok(trial);
            }
        }
        Err(NestError::Sampler(
            ErrorInfo::new("rejection-exhausted", "no point found above the contour bound")
                .with_context("max_attempts", self.max_attempts.to_string())
                .with_context("bound", bound.to_string())
                .with_hint("switch to the slice sampler for this problem"),
        ))
    }
}
