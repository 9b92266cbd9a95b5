use nest_core::derive_substream_seed;

/// Derives the seed for drawing the i-th initial live point.
pub fn initial_point_seed(master_seed: u64, index: usize) -> u64 {
    derive_substream_seed(master_seed, index as u64)
}

/// Derives the seed for the master's seed-body selection of a task.
///
/// Keyed by the task counter rather than the worker index, so the draw
/// sequence is independent of which worker ends up executing the task.
pub fn seed_choice_seed(master_seed: u64, task_counter: u64) -> u64 {
    derive_substream_seed(master_seed ^ 0x5EED_B0D1_5EED_B0D1, task_counter)
}

/// Derives the seed driving a task's within-contour sampler.
pub fn task_sampler_seed(master_seed: u64, task_counter: u64) -> u64 {
    derive_substream_seed(master_seed ^ 0xC04D_5A4B_1E55_ED00, task_counter)
}

/// Derives the seed for equal-weight posterior thinning.
pub fn equal_weights_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ 0xE09A_17E1_9A75_0000, u64::MAX)
}
