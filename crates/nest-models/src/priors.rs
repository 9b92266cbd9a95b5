//! Concrete prior families composed block-wise over disjoint index sets.

use nest_core::{ErrorInfo, NestError, PriorTransform};

fn domain_error(block: &str, index: usize, value: f64) -> NestError {
    NestError::Prior(
        ErrorInfo::new("hypercube-out-of-range", "prior block received input outside [0,1]")
            .with_context("block", block)
            .with_context("index", index.to_string())
            .with_context("value", value.to_string())
            .with_hint("this indicates corrupted stack data; delete the resume file"),
    )
}

fn check_unit(block: &str, cube: &[f64]) -> Result<(), NestError> {
    for (index, &value) in cube.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(domain_error(block, index, value));
        }
    }
    Ok(())
}

/// One independent factor of a composite prior, mapping a contiguous
/// hypercube slice to the matching physical slice.
pub trait PriorBlock: Send + Sync {
    /// Number of dimensions consumed by the block.
    fn ndims(&self) -> usize;

    /// Fills `physical` from `cube`; both slices have `ndims` length.
    fn transform(&self, cube: &[f64], physical: &mut [f64]) -> Result<(), NestError>;
}

/// Uniform prior on `[min, max]` in every dimension of the block.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    ndims: usize,
    min: f64,
    max: f64,
}

impl UniformBlock {
    /// Creates a uniform block; `min < max` is required.
    pub fn new(ndims: usize, min: f64, max: f64) -> Result<Self, NestError> {
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(NestError::Config(
                ErrorInfo::new("bad-uniform-range", "uniform prior needs finite min < max")
                    .with_context("min", min.to_string())
                    .with_context("max", max.to_string()),
            ));
        }
        Ok(Self { ndims, min, max })
    }
}

impl PriorBlock for UniformBlock {
    fn ndims(&self) -> usize {
        self.ndims
    }

    fn transform(&self, cube: &[f64], physical: &mut [f64]) -> Result<(), NestError> {
        check_unit("uniform", cube)?;
        for (theta, &u) in physical.iter_mut().zip(cube.iter()) {
            *theta = self.min + (self.max - self.min) * u;
        }
        Ok(())
    }
}

/// Independent Gaussian prior with common mean and standard deviation.
#[derive(Debug, Clone)]
pub struct GaussianBlock {
    ndims: usize,
    mean: f64,
    sigma: f64,
}

impl GaussianBlock {
    /// Creates a Gaussian block; `sigma > 0` is required.
    pub fn new(ndims: usize, mean: f64, sigma: f64) -> Result<Self, NestError> {
        if !(sigma > 0.0) || !sigma.is_finite() || !mean.is_finite() {
            return Err(NestError::Config(
                ErrorInfo::new("bad-gaussian-width", "gaussian prior needs finite sigma > 0")
                    .with_context("sigma", sigma.to_string()),
            ));
        }
        Ok(Self { ndims, mean, sigma })
    }
}

impl PriorBlock for GaussianBlock {
    fn ndims(&self) -> usize {
        self.ndims
    }

    fn transform(&self, cube: &[f64], physical: &mut [f64]) -> Result<(), NestError> {
        check_unit("gaussian", cube)?;
        for (theta, &u) in physical.iter_mut().zip(cube.iter()) {
            *theta = self.mean + self.sigma * normal_quantile(u);
        }
        Ok(())
    }
}

/// Log-uniform (Jeffreys) prior on `[min, max]` with `0 < min < max`.
#[derive(Debug, Clone)]
pub struct LogUniformBlock {
    ndims: usize,
    log_min: f64,
    log_ratio: f64,
}

impl LogUniformBlock {
    /// Creates a log-uniform block; `0 < min < max` is required.
    pub fn new(ndims: usize, min: f64, max: f64) -> Result<Self, NestError> {
        if !(min > 0.0 && min < max) || !max.is_finite() {
            return Err(NestError::Config(
                ErrorInfo::new("bad-loguniform-range", "log-uniform prior needs 0 < min < max")
                    .with_context("min", min.to_string())
                    .with_context("max", max.to_string()),
            ));
        }
        Ok(Self {
            ndims,
            log_min: min.ln(),
            log_ratio: (max / min).ln(),
        })
    }
}

impl PriorBlock for LogUniformBlock {
    fn ndims(&self) -> usize {
        self.ndims
    }

    fn transform(&self, cube: &[f64], physical: &mut [f64]) -> Result<(), NestError> {
        check_unit("log-uniform", cube)?;
        for (theta, &u) in physical.iter_mut().zip(cube.iter()) {
            *theta = (self.log_min + self.log_ratio * u).exp();
        }
        Ok(())
    }
}

/// Prior transform composed of independent blocks over disjoint,
/// contiguous index ranges.
pub struct CompositePrior {
    blocks: Vec<Box<dyn PriorBlock>>,
    ndims: usize,
}

impl CompositePrior {
    /// Builds a composite prior; at least one block is required.
    pub fn new(blocks: Vec<Box<dyn PriorBlock>>) -> Result<Self, NestError> {
        if blocks.is_empty() {
            return Err(NestError::Config(ErrorInfo::new(
                "empty-prior",
                "composite prior needs at least one block",
            )));
        }
        let ndims = blocks.iter().map(|block| block.ndims()).sum();
        Ok(Self { blocks, ndims })
    }

    /// Convenience constructor for a single uniform box prior.
    pub fn uniform(ndims: usize, min: f64, max: f64) -> Result<Self, NestError> {
        Self::new(vec![Box::new(UniformBlock::new(ndims, min, max)?)])
    }
}

impl PriorTransform for CompositePrior {
    fn ndims(&self) -> usize {
        self.ndims
    }

    fn transform(&self, hypercube: &[f64], physical: &mut [f64]) -> Result<(), NestError> {
        let mut offset = 0;
        for block in &self.blocks {
            let width = block.ndims();
            block.transform(
                &hypercube[offset..offset + width],
                &mut physical[offset..offset + width],
            )?;
            offset += width;
        }
        Ok(())
    }
}

/// Inverse CDF of the standard normal distribution.
///
/// Acklam's rational approximation (relative error below 1.15e-9 over the
/// open unit interval); the pack carries no special-functions crate and
/// this accuracy is ample for prior transforms.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
