use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use nest_core::{
    ErrorInfo, NestError, Point, PointEvaluator, RngHandle, RunProvenance, SlotStatus,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::checkpoint::{ResumePayload, RESUME_SCHEMA};
use crate::config::RunConfig;
use crate::determinism;
use crate::evidence::EvidenceState;
use crate::feedback::Feedback;
use crate::model::Model;
use crate::output::{self, DeadWriter, StatsPayload};
use crate::posterior::PosteriorReservoir;
use crate::scheduler::{generate_seed, InlineTransport, SeedOutcome, ThreadTransport, Transport};
use crate::stack::LiveStack;

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Log-evidence point estimate.
    pub log_z: f64,
    /// Error bar on the log-evidence.
    pub log_z_err: f64,
    /// Deaths recorded over the whole run.
    pub ndead: u64,
    /// Total likelihood calls charged to the run.
    pub total_likelihood_calls: u64,
    /// Mean likelihood calls per generation at termination.
    pub mean_likelihood_calls: f64,
    /// Posterior rows stored in the reservoir.
    pub nposterior: usize,
    /// Whether the run continued from a checkpoint.
    pub resumed: bool,
    /// Files written under the output directory.
    pub files: Vec<PathBuf>,
}

/// Mutable sampler state threaded through the master loop and persisted
/// at every checkpoint.
struct SamplerState {
    stack: LiveStack,
    evidence: EvidenceState,
    posterior: PosteriorReservoir,
    task_counter: u64,
    mean_likelihood_calls: f64,
    total_likelihood_calls: u64,
}

/// Runs the sampler from scratch, or from an existing checkpoint when
/// `read_resume` is set and one is present.
pub fn run(config: &RunConfig, model: Arc<Model>) -> Result<RunSummary, NestError> {
    config.validate(model.ndims())?;
    let resume_path = config.output.file(".resume");
    if config.output.read_resume && resume_path.exists() {
        let state = load_state(config, &model)?;
        return run_master(config, model, state, true);
    }
    let state = fresh_state(config, &model)?;
    run_master(config, model, state, false)
}

/// Resumes explicitly from the checkpoint on disk; errors when absent.
pub fn resume(config: &RunConfig, model: Arc<Model>) -> Result<RunSummary, NestError> {
    config.validate(model.ndims())?;
    let resume_path = config.output.file(".resume");
    if !resume_path.exists() {
        return Err(NestError::Resume(
            ErrorInfo::new("resume-missing", "no checkpoint to resume from")
                .with_context("path", resume_path.display().to_string()),
        ));
    }
    let state = load_state(config, &model)?;
    run_master(config, model, state, true)
}

fn fresh_state(config: &RunConfig, model: &Model) -> Result<SamplerState, NestError> {
    let layout = model.layout();
    let nstack = config.resolved_nstack(layout.ndims);
    let mut stack = LiveStack::new(layout, config.nlive, nstack);
    stack.generate_initial(model, config.seed_policy.master_seed)?;
    let mut evidence = EvidenceState::new();
    evidence.refresh_live(stack.live_logls());
    let total_likelihood_calls = stack.slots().iter().map(|point| point.nlike).sum();
    Ok(SamplerState {
        stack,
        evidence,
        posterior: PosteriorReservoir::new(
            config.resolved_nmax_posterior(),
            config.posterior.minimum_weight,
        ),
        task_counter: 0,
        mean_likelihood_calls: 0.0,
        total_likelihood_calls,
    })
}

fn load_state(config: &RunConfig, model: &Model) -> Result<SamplerState, NestError> {
    let resume_path = config.output.file(".resume");
    let payload = ResumePayload::load(&resume_path)?;
    let layout = model.layout();
    if payload.layout != layout {
        return Err(NestError::Resume(
            ErrorInfo::new("resume-layout", "checkpoint does not match the model dimensions")
                .with_context("checkpoint_ndims", payload.layout.ndims.to_string())
                .with_context("model_ndims", layout.ndims.to_string())
                .with_hint("delete the resume file or disable read_resume"),
        ));
    }
    let mut stack = LiveStack::from_points(payload.points, layout, payload.nlive);
    stack.cancel_gestating();
    let mut evidence = payload.evidence;
    evidence.refresh_live(stack.live_logls());
    Ok(SamplerState {
        stack,
        evidence,
        posterior: PosteriorReservoir::from_samples(
            payload.posterior,
            config.resolved_nmax_posterior(),
            config.posterior.minimum_weight,
        ),
        task_counter: payload.task_counter,
        mean_likelihood_calls: payload.mean_likelihood_calls,
        total_likelihood_calls: payload.total_likelihood_calls,
    })
}

fn run_master(
    config: &RunConfig,
    model: Arc<Model>,
    mut state: SamplerState,
    resumed: bool,
) -> Result<RunSummary, NestError> {
    let ndims = model.ndims();
    let num_repeats = config.resolved_num_repeats(ndims);
    let master_seed = config.seed_policy.master_seed;
    let update_interval = config.resolved_update_interval();
    let mut feedback = Feedback::new(config.feedback);
    feedback.preamble(config, ndims, model.nderived(), resumed);

    std::fs::create_dir_all(&config.output.base_dir)
        .map_err(|err| NestError::io("output-mkdir", err, config.output.base_dir.display()))?;
    let provenance = build_provenance(config);
    let mut files = Vec::new();

    if config.output.write_paramnames {
        let path = config.output.file(".paramnames");
        output::write_paramnames(&path, state.stack.layout())?;
        files.push(path);
    }
    let mut dead_writer = if config.output.write_dead {
        Some(DeadWriter::new(config.output.file("_dead.txt"), resumed)?)
    } else {
        None
    };
    let mut pending_dead: Vec<Point> = Vec::new();

    let mut transport: Box<dyn Transport> = if config.workers == 0 {
        Box::new(InlineTransport::new(
            Arc::clone(&model),
            &config.sampler,
            num_repeats,
        ))
    } else {
        Box::new(ThreadTransport::spawn(
            Arc::clone(&model),
            &config.sampler,
            num_repeats,
            config.workers,
        ))
    };
    let nworkers = transport.workers();
    let mut busy = vec![false; nworkers];

    // Initial dispatch: one seed per worker, in sequence. A resumed run
    // skips this and lets the main loop promote the checkpointed backlog
    // first, which keeps the continuation identical to the uninterrupted
    // sequence.
    if !resumed {
        for worker in 0..nworkers {
            match generate_seed(&mut state.stack, master_seed, state.task_counter) {
                SeedOutcome::Ready(task) => {
                    state.task_counter += 1;
                    transport.dispatch(worker, task);
                    busy[worker] = true;
                }
                SeedOutcome::Stalled => {
                    transport.shutdown();
                    return Err(NestError::Config(
                        ErrorInfo::new(
                            "initial-dispatch-stalled",
                            "could not seed every worker from the initial population",
                        )
                        .with_context("workers", nworkers.to_string())
                        .with_context("nlive", config.nlive.to_string())
                        .with_hint("reduce the worker count or raise nlive"),
                    ));
                }
            }
        }
    }

    let mut promotions_since_feedback = 0usize;
    let mut promotions_since_update = 0usize;
    // A resumed checkpoint may already satisfy the stopping criterion.
    let mut more_samples_needed = !(state.evidence.is_converged(config.precision_criterion)
        || (config.max_ndead > 0 && state.evidence.ndead >= config.max_ndead as u64));

    while more_samples_needed {
        let mut made_progress = false;

        // Collect: non-blocking probe, one receive per pending message.
        while let Some(birth) = transport.try_collect() {
            busy[birth.worker] = false;
            made_progress = true;
            match birth.outcome {
                Ok(baby) => {
                    state.total_likelihood_calls += baby.nlike;
                    state.stack.deliver(birth.slot, baby);
                }
                Err(err) => {
                    feedback.contained_error("within-contour sampler", &err.to_string());
                    cancel_reservation(&mut state.stack, birth.slot);
                }
            }
        }

        // Promote: record deaths while the lowest live point's daughter
        // has arrived.
        while more_samples_needed {
            let Some(mother) = state.stack.lowest_live() else {
                break;
            };
            let Some(daughter) = state.stack.slot(mother).status.daughter() else {
                break;
            };
            if !state.stack.slot(daughter).status.is_live() {
                break;
            }
            made_progress = true;

            let late = state.stack.slot(mother).clone();
            state.stack.slot_mut(mother).clear();
            let nlive = state.stack.nlive();
            let log_w = state.evidence.record_death(late.logl, nlive);
            state.evidence.refresh_live(state.stack.live_logls());
            state.posterior.offer(&late, log_w, state.evidence.log_z());

            let baby_nlike = state.stack.slot(daughter).nlike as f64;
            state.mean_likelihood_calls +=
                (baby_nlike - state.mean_likelihood_calls) / nlive as f64;
            if dead_writer.is_some() {
                pending_dead.push(late);
            }

            promotions_since_feedback += 1;
            if promotions_since_feedback >= config.nlive {
                promotions_since_feedback = 0;
                feedback.progress(
                    state.evidence.ndead,
                    state.mean_likelihood_calls,
                    state.evidence.log_z(),
                    state.evidence.log_z_err(),
                );
            }

            if state.evidence.is_converged(config.precision_criterion)
                || (config.max_ndead > 0 && state.evidence.ndead >= config.max_ndead as u64)
            {
                more_samples_needed = false;
            }

            promotions_since_update += 1;
            if promotions_since_update >= update_interval {
                promotions_since_update = 0;
                refresh_outputs(
                    config,
                    &state,
                    &provenance,
                    &mut dead_writer,
                    &mut pending_dead,
                    &feedback,
                );
            }
        }

        if !more_samples_needed {
            break;
        }

        // Dispatch: hand a seed to every idle worker.
        for worker in 0..nworkers {
            if busy[worker] {
                continue;
            }
            match generate_seed(&mut state.stack, master_seed, state.task_counter) {
                SeedOutcome::Ready(task) => {
                    state.task_counter += 1;
                    transport.dispatch(worker, task);
                    busy[worker] = true;
                    made_progress = true;
                }
                SeedOutcome::Stalled => {
                    // Advance the counter so a retry draws a fresh
                    // substream instead of repeating the same rejections.
                    state.task_counter += 1;
                    feedback.stall(state.evidence.ndead);
                    break;
                }
            }
        }

        if !made_progress {
            std::thread::yield_now();
        }
    }

    // Shutdown: drain one pending receive per busy worker, then end.
    for worker in 0..nworkers {
        if !busy[worker] {
            continue;
        }
        if let Some(birth) = transport.drain_one(worker) {
            match birth.outcome {
                Ok(baby) => {
                    state.total_likelihood_calls += baby.nlike;
                    state.stack.deliver(birth.slot, baby);
                }
                Err(_) => cancel_reservation(&mut state.stack, birth.slot),
            }
        }
        busy[worker] = false;
    }
    transport.shutdown();

    refresh_outputs(
        config,
        &state,
        &provenance,
        &mut dead_writer,
        &mut pending_dead,
        &feedback,
    );
    collect_output_files(config, &mut files);

    if config.output.write_stats {
        let path = config.output.file(".stats");
        let stats = StatsPayload {
            provenance: provenance.clone(),
            log_z: state.evidence.log_z(),
            log_z_err: state.evidence.log_z_err(),
            ndead: state.evidence.ndead,
            total_likelihood_calls: state.total_likelihood_calls,
            mean_likelihood_calls: state.mean_likelihood_calls,
            nposterior: state.posterior.len(),
        };
        if let Err(err) = output::write_stats(&path, &stats) {
            feedback.contained_error("stats write", &err.to_string());
        } else {
            files.push(path);
        }
    }

    feedback.summary(
        state.evidence.ndead,
        state.total_likelihood_calls,
        state.evidence.log_z(),
        state.evidence.log_z_err(),
        state.posterior.len(),
    );

    Ok(RunSummary {
        log_z: state.evidence.log_z(),
        log_z_err: state.evidence.log_z_err(),
        ndead: state.evidence.ndead,
        total_likelihood_calls: state.total_likelihood_calls,
        mean_likelihood_calls: state.mean_likelihood_calls,
        nposterior: state.posterior.len(),
        resumed,
        files,
    })
}

/// Reblanks a failed reservation and returns its mother to `Waiting`.
fn cancel_reservation(stack: &mut LiveStack, slot: usize) {
    for index in 0..stack.capacity() {
        if stack.slot(index).status == SlotStatus::Daughter(slot) {
            stack.slot_mut(index).status = SlotStatus::Waiting;
            break;
        }
    }
    stack.slot_mut(slot).clear();
}

/// Periodic refresh of checkpoint and sample files. Write failures are
/// contained: the next successful refresh supersedes them.
fn refresh_outputs(
    config: &RunConfig,
    state: &SamplerState,
    provenance: &RunProvenance,
    dead_writer: &mut Option<DeadWriter>,
    pending_dead: &mut Vec<Point>,
    feedback: &Feedback,
) {
    if config.output.write_resume {
        let payload = ResumePayload {
            schema_version: RESUME_SCHEMA,
            provenance: provenance.clone(),
            layout: state.stack.layout(),
            nlive: state.stack.nlive(),
            points: state.stack.slots().to_vec(),
            evidence: state.evidence.clone(),
            task_counter: state.task_counter,
            mean_likelihood_calls: state.mean_likelihood_calls,
            total_likelihood_calls: state.total_likelihood_calls,
            posterior: state.posterior.samples().to_vec(),
        };
        if let Err(err) = payload.store(&config.output.file(".resume")) {
            feedback.contained_error("checkpoint write", &err.to_string());
        }
    }
    if config.output.posteriors {
        let path = config.output.file(".txt");
        if let Err(err) = output::write_posterior(&path, &state.posterior, state.evidence.log_z())
        {
            feedback.contained_error("posterior write", &err.to_string());
        }
    }
    if config.output.equals {
        let path = config.output.file("_equal_weights.txt");
        let mut rng = RngHandle::from_seed(determinism::equal_weights_seed(
            config.seed_policy.master_seed,
        ));
        if let Err(err) = output::write_equal_weights(&path, &state.posterior, &mut rng) {
            feedback.contained_error("equal-weights write", &err.to_string());
        }
    }
    if config.output.write_live {
        let path = config.output.file("_phys_live.txt");
        if let Err(err) = output::write_phys_live(&path, &state.stack) {
            feedback.contained_error("live write", &err.to_string());
        }
    }
    if let Some(writer) = dead_writer {
        if let Err(err) = writer.append(pending_dead) {
            feedback.contained_error("dead write", &err.to_string());
        } else {
            pending_dead.clear();
        }
    }
}

fn collect_output_files(config: &RunConfig, files: &mut Vec<PathBuf>) {
    let candidates = [
        (config.output.write_resume, ".resume"),
        (config.output.posteriors, ".txt"),
        (config.output.equals, "_equal_weights.txt"),
        (config.output.write_live, "_phys_live.txt"),
        (config.output.write_dead, "_dead.txt"),
    ];
    for (enabled, suffix) in candidates {
        if enabled {
            let path = config.output.file(suffix);
            if path.exists() {
                files.push(path);
            }
        }
    }
}

fn build_provenance(config: &RunConfig) -> RunProvenance {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(config).unwrap_or_default());
    let input_hash = hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs().to_string())
        .unwrap_or_default();
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "nest-engine".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    RunProvenance {
        input_hash,
        seed: config.seed_policy.master_seed,
        created_at,
        tool_versions,
    }
}
