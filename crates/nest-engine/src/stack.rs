use nest_core::{Point, PointEvaluator, PointLayout, RngHandle, SlotStatus};
use nest_core::NestError;
use serde::{Deserialize, Serialize};

use crate::determinism;

/// Arena of sample slots holding the live population, gestating
/// reservations, and blank capacity.
///
/// The scheduler is the sole writer. Mother and daughter reference each
/// other through plain slot indices; the arena owns every point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStack {
    points: Vec<Point>,
    layout: PointLayout,
    nlive: usize,
}

impl LiveStack {
    /// Creates an all-blank stack with `nstack` slots.
    pub fn new(layout: PointLayout, nlive: usize, nstack: usize) -> Self {
        let capacity = nstack.max(2 * nlive);
        Self {
            points: (0..capacity).map(|_| Point::blank(layout)).collect(),
            layout,
            nlive,
        }
    }

    /// Rebuilds a stack from checkpointed slots.
    pub fn from_points(points: Vec<Point>, layout: PointLayout, nlive: usize) -> Self {
        Self {
            points,
            layout,
            nlive,
        }
    }

    /// Point layout shared by every slot.
    pub fn layout(&self) -> PointLayout {
        self.layout
    }

    /// Target live population size.
    pub fn nlive(&self) -> usize {
        self.nlive
    }

    /// Backing-array capacity.
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Populates the first `nlive` slots with uniform hypercube draws.
    ///
    /// Initial points carry an open contour (`logl_birth = -inf`) and a
    /// chord hint of `sqrt(ndims)`, the hypercube diagonal scale.
    pub fn generate_initial(
        &mut self,
        evaluator: &dyn PointEvaluator,
        master_seed: u64,
    ) -> Result<(), NestError> {
        let chord = (self.layout.ndims as f64).sqrt();
        for index in 0..self.nlive {
            let mut rng =
                RngHandle::from_seed(determinism::initial_point_seed(master_seed, index));
            let point = &mut self.points[index];
            point.clear();
            for coord in point.hypercube.iter_mut() {
                *coord = rng.uniform();
            }
            evaluator.evaluate(point)?;
            point.logl_birth = f64::NEG_INFINITY;
            point.last_chord = chord;
            point.status = SlotStatus::Waiting;
        }
        for point in self.points.iter_mut().skip(self.nlive) {
            point.clear();
        }
        Ok(())
    }

    /// Index of the minimum-likelihood slot among all live slots.
    pub fn lowest_live(&self) -> Option<usize> {
        self.argmin(|point| point.is_live())
    }

    /// Index of the minimum-likelihood slot among live slots that have
    /// not launched a daughter yet.
    pub fn lowest_waiting(&self) -> Option<usize> {
        self.argmin(|point| point.status == SlotStatus::Waiting)
    }

    fn argmin(&self, keep: impl Fn(&Point) -> bool) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, point) in self.points.iter().enumerate() {
            if !keep(point) {
                continue;
            }
            match best {
                Some(current) if self.points[current].logl <= point.logl => {}
                _ => best = Some(index),
            }
        }
        best
    }

    /// Claims a blank slot, marking it gestating. Returns `None` when the
    /// arena is full.
    pub fn claim_blank(&mut self) -> Option<usize> {
        let index = self
            .points
            .iter()
            .position(|point| point.status == SlotStatus::Blank)?;
        self.points[index].status = SlotStatus::Gestating;
        Some(index)
    }

    /// Read access to a slot.
    pub fn slot(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// Write access to a slot.
    pub fn slot_mut(&mut self, index: usize) -> &mut Point {
        &mut self.points[index]
    }

    /// Installs an arrived point into its reserved slot as live.
    pub fn deliver(&mut self, slot: usize, mut baby: Point) {
        debug_assert_eq!(self.points[slot].status, SlotStatus::Gestating);
        baby.status = SlotStatus::Waiting;
        self.points[slot] = baby;
    }

    /// Number of live slots.
    pub fn num_live(&self) -> usize {
        self.points.iter().filter(|point| point.is_live()).count()
    }

    /// Number of gestating reservations.
    pub fn num_gestating(&self) -> usize {
        self.points
            .iter()
            .filter(|point| point.status == SlotStatus::Gestating)
            .count()
    }

    /// Log-likelihoods of every live slot.
    pub fn live_logls(&self) -> impl Iterator<Item = f64> + '_ {
        self.points
            .iter()
            .filter(|point| point.is_live())
            .map(|point| point.logl)
    }

    /// All slots, for checkpointing and the live-point output file.
    pub fn slots(&self) -> &[Point] {
        &self.points
    }

    /// Cancels every gestating reservation after a resume.
    ///
    /// The reserved slots are reblanked and their mothers returned to
    /// `Waiting`, so interrupted in-flight work is simply regenerated.
    pub fn cancel_gestating(&mut self) {
        for index in 0..self.points.len() {
            if let SlotStatus::Daughter(daughter) = self.points[index].status {
                if self.points[daughter].status == SlotStatus::Gestating {
                    self.points[daughter].clear();
                    self.points[index].status = SlotStatus::Waiting;
                }
            }
        }
        // Orphaned reservations (mother already promoted) cannot occur in
        // a consistent checkpoint, but reblank them all the same.
        for point in self.points.iter_mut() {
            if point.status == SlotStatus::Gestating {
                point.clear();
            }
        }
    }
}
