use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use nest_core::{ContourSampler, NestError, Point, RngHandle, SlotStatus};

use crate::config::SamplerPolicy;
use crate::determinism;
use crate::model::Model;
use crate::slice::build_sampler;
use crate::stack::LiveStack;

/// Rejection ceiling multiplier for the seed-body draw.
const SEED_REJECTION_FACTOR: usize = 10;

/// One unit of work dispatched to a worker: the seed point, the slot its
/// baby must land in, and the substream seed driving the sampler.
#[derive(Debug, Clone)]
pub struct Task {
    /// Pre-reserved stack slot for the replacement point.
    pub slot: usize,
    /// Seed body with `logl_birth` set to the contour bound.
    pub seed: Point,
    /// Deterministic seed for the worker's RNG, keyed by task counter.
    pub sampler_seed: u64,
}

/// Message from the master to a worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Generate a replacement point for the carried task.
    Run(Task),
    /// Drain and exit.
    End,
}

/// Message from a worker back to the master.
#[derive(Debug)]
pub struct Birth {
    /// Worker that produced the result.
    pub worker: usize,
    /// Stack slot reserved for the point.
    pub slot: usize,
    /// The replacement point, or the contained failure.
    pub outcome: Result<Point, NestError>,
}

/// Exchange seam between the master and its workers.
///
/// Models the group-communication transport: one reliable ordered channel
/// pair per worker, a non-blocking probe on the master side, and a
/// blocking receive on the worker side.
pub trait Transport {
    /// Number of logical workers.
    fn workers(&self) -> usize;

    /// Sends a task to the given worker.
    fn dispatch(&mut self, worker: usize, task: Task);

    /// Non-blocking probe over all workers; returns one pending birth.
    fn try_collect(&mut self) -> Option<Birth>;

    /// Blocking receive of the outstanding result from one worker, used
    /// while draining at shutdown.
    fn drain_one(&mut self, worker: usize) -> Option<Birth>;

    /// Signals end-of-run to every worker and releases them.
    fn shutdown(&mut self);
}

/// Transport that runs tasks inline on the master thread.
///
/// Worker count is one; a dispatched task completes synchronously and is
/// collected at the next probe. This is the deterministic reference
/// configuration (`workers = 0`).
pub struct InlineTransport {
    model: Arc<Model>,
    sampler: Box<dyn ContourSampler>,
    pending: VecDeque<Birth>,
}

impl InlineTransport {
    /// Creates the inline transport with the configured sampler.
    pub fn new(model: Arc<Model>, policy: &SamplerPolicy, num_repeats: usize) -> Self {
        Self {
            model,
            sampler: build_sampler(policy, num_repeats),
            pending: VecDeque::new(),
        }
    }
}

impl Transport for InlineTransport {
    fn workers(&self) -> usize {
        1
    }

    fn dispatch(&mut self, worker: usize, task: Task) {
        let mut rng = RngHandle::from_seed(task.sampler_seed);
        let outcome = self
            .sampler
            .sample(&task.seed, self.model.as_ref(), &mut rng);
        self.pending.push_back(Birth {
            worker,
            slot: task.slot,
            outcome,
        });
    }

    fn try_collect(&mut self) -> Option<Birth> {
        self.pending.pop_front()
    }

    fn drain_one(&mut self, _worker: usize) -> Option<Birth> {
        self.pending.pop_front()
    }

    fn shutdown(&mut self) {
        self.pending.clear();
    }
}

/// Transport backed by OS threads and per-worker channel pairs.
pub struct ThreadTransport {
    requests: Vec<Sender<WorkerRequest>>,
    births: Vec<Receiver<Birth>>,
    handles: Vec<JoinHandle<()>>,
    probe_cursor: usize,
}

impl ThreadTransport {
    /// Spawns `workers` threads, each owning its sampler instance.
    pub fn spawn(
        model: Arc<Model>,
        policy: &SamplerPolicy,
        num_repeats: usize,
        workers: usize,
    ) -> Self {
        let mut requests = Vec::with_capacity(workers);
        let mut births = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
            let (birth_tx, birth_rx) = mpsc::channel::<Birth>();
            let worker_model = Arc::clone(&model);
            let sampler = build_sampler(policy, num_repeats);
            handles.push(std::thread::spawn(move || {
                worker_loop(worker, worker_model, sampler, request_rx, birth_tx);
            }));
            requests.push(request_tx);
            births.push(birth_rx);
        }
        Self {
            requests,
            births,
            handles,
            probe_cursor: 0,
        }
    }
}

impl Transport for ThreadTransport {
    fn workers(&self) -> usize {
        self.requests.len()
    }

    fn dispatch(&mut self, worker: usize, task: Task) {
        // A send failure means the worker died; its absence is observed
        // as a permanently busy worker and the run stalls out visibly.
        let _ = self.requests[worker].send(WorkerRequest::Run(task));
    }

    fn try_collect(&mut self) -> Option<Birth> {
        let count = self.births.len();
        for offset in 0..count {
            let index = (self.probe_cursor + offset) % count;
            match self.births[index].try_recv() {
                Ok(birth) => {
                    self.probe_cursor = (index + 1) % count;
                    return Some(birth);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }
        }
        None
    }

    fn drain_one(&mut self, worker: usize) -> Option<Birth> {
        self.births[worker].recv().ok()
    }

    fn shutdown(&mut self) {
        for sender in &self.requests {
            let _ = sender.send(WorkerRequest::End);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Worker body: blocking receive, sample, reply.
fn worker_loop(
    worker: usize,
    model: Arc<Model>,
    mut sampler: Box<dyn ContourSampler>,
    requests: Receiver<WorkerRequest>,
    births: Sender<Birth>,
) {
    while let Ok(request) = requests.recv() {
        match request {
            WorkerRequest::End => break,
            WorkerRequest::Run(task) => {
                let mut rng = RngHandle::from_seed(task.sampler_seed);
                let outcome = sampler.sample(&task.seed, model.as_ref(), &mut rng);
                let birth = Birth {
                    worker,
                    slot: task.slot,
                    outcome,
                };
                if births.send(birth).is_err() {
                    break;
                }
            }
        }
    }
}

/// Outcome of a seed-generation attempt.
#[derive(Debug)]
pub enum SeedOutcome {
    /// A task ready for dispatch.
    Ready(Task),
    /// No mother, no blank slot, or no valid body this iteration; the
    /// caller retries after the next collection.
    Stalled,
}

/// Generates the next constrained-sampling task.
///
/// Picks the lowest live point without a daughter as the mother, reserves
/// a blank slot, and draws the seed body uniformly over the stack until a
/// live point strictly above the mother's contour with a birth contour no
/// tighter than it is found. The body filter keeps the nested-sampling
/// invariant intact under out-of-order completions.
pub fn generate_seed(
    stack: &mut LiveStack,
    master_seed: u64,
    task_counter: u64,
) -> SeedOutcome {
    let Some(mother) = stack.lowest_waiting() else {
        return SeedOutcome::Stalled;
    };
    let Some(slot) = stack.claim_blank() else {
        return SeedOutcome::Stalled;
    };
    let bound = stack.slot(mother).logl;

    let mut rng = RngHandle::from_seed(determinism::seed_choice_seed(master_seed, task_counter));
    let capacity = stack.capacity();
    let mut body = None;
    for _ in 0..SEED_REJECTION_FACTOR * capacity {
        let candidate = rng.index(capacity);
        let point = stack.slot(candidate);
        // Ties at the bound are admitted so likelihood plateaus keep
        // progressing; for continuous likelihoods this coincides with
        // the strict-interior filter almost surely.
        if point.is_live() && point.logl >= bound && point.logl_birth <= bound {
            body = Some(candidate);
            break;
        }
    }
    let Some(body) = body else {
        // Roll the reservation back and let the master retry later.
        stack.slot_mut(slot).clear();
        return SeedOutcome::Stalled;
    };

    stack.slot_mut(mother).status = SlotStatus::Daughter(slot);
    let mut seed = stack.slot(body).clone();
    seed.logl_birth = bound;
    SeedOutcome::Ready(Task {
        slot,
        seed,
        sampler_seed: determinism::task_sampler_seed(master_seed, task_counter),
    })
}
