use nest_core::{
    ErrorInfo, LogLikelihood, NestError, Point, PointEvaluator, PointLayout, PriorTransform,
};

/// Model evaluator pairing a prior transform with a user likelihood.
///
/// Shared read-only across workers; each evaluation fills one point
/// record in place and charges one likelihood call to it. The callback is
/// treated as pure: a NaN return is contained by coercing to `-inf`,
/// which keeps the point at the bottom of the ordering and out of every
/// promotion.
pub struct Model {
    prior: Box<dyn PriorTransform>,
    likelihood: Box<dyn LogLikelihood>,
    layout: PointLayout,
}

impl Model {
    /// Builds a model from its two callbacks.
    pub fn new(
        prior: Box<dyn PriorTransform>,
        likelihood: Box<dyn LogLikelihood>,
    ) -> Result<Self, NestError> {
        let layout = PointLayout::new(prior.ndims(), likelihood.nderived());
        if layout.ndims == 0 {
            return Err(NestError::Config(ErrorInfo::new(
                "zero-dimensions",
                "the prior transform reports zero dimensions",
            )));
        }
        Ok(Self {
            prior,
            likelihood,
            layout,
        })
    }

    /// Number of sampled dimensions.
    pub fn ndims(&self) -> usize {
        self.layout.ndims
    }

    /// Number of derived quantities.
    pub fn nderived(&self) -> usize {
        self.layout.nderived
    }
}

impl PointEvaluator for Model {
    fn layout(&self) -> PointLayout {
        self.layout
    }

    fn evaluate(&self, point: &mut Point) -> Result<(), NestError> {
        self.prior.transform(&point.hypercube, &mut point.physical)?;
        let logl = self
            .likelihood
            .log_likelihood(&point.physical, &mut point.derived);
        point.logl = if logl.is_nan() { f64::NEG_INFINITY } else { logl };
        point.nlike += 1;
        Ok(())
    }
}
