//! Plain-data contract between the coordinator and worker threads
//!
//! A job sees only flat primitive arrays copied out of a chunk, indexed by
//! the chunk's row-major flattened cell index. Uncollapsed cells hold `-1` in
//! the state array. Candidate lists are padded to [`MAX_STATES_PER_CELL`]
//! entries with `-1`.

use crate::io::configuration::MAX_STATES_PER_CELL;
use crate::spatial::chunk::{Chunk, ChunkPosition};
use crate::spatial::direction::Direction;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Marker for an uncollapsed cell or an unused candidate slot
pub const UNCOLLAPSED: i32 = -1;

/// Kind of work a job performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobType {
    /// Collapse until done or out of iterations, then mark the chunk fully collapsed
    FullCollapse,
    /// Collapse up to the iteration budget, leaving the chunk open
    PartialCollapse,
}

/// Flat snapshot of a chunk handed to a worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobInput {
    /// Chunk the snapshot was taken from
    pub chunk: ChunkPosition,
    /// Kind of work requested
    pub job_type: JobType,
    /// Chunk edge length
    pub chunk_size: usize,
    /// Collapse budget
    pub max_iterations: usize,
    /// Seed for the job's random choices
    pub seed: u64,
    /// Collapsed state per cell or [`UNCOLLAPSED`]
    pub states: Vec<i32>,
    /// Candidate count per cell
    pub entropy: Vec<i32>,
    /// Candidate lists, [`MAX_STATES_PER_CELL`] slots per cell
    pub possible_states: Vec<i32>,
    /// Number of used slots per cell
    pub possible_counts: Vec<i32>,
    /// Whether each cell lies on a chunk face
    pub boundary: Vec<bool>,
    /// Cells whose candidate list was cut to fit the slot count
    pub truncated_cells: usize,
}

impl JobInput {
    /// Copy a chunk's cell states into flat arrays
    ///
    /// Reads through the chunk's live representation without restoring it.
    pub fn from_chunk(chunk: &Chunk, job_type: JobType, max_iterations: usize, seed: u64) -> Self {
        let size = chunk.size();
        let cell_count = chunk.cell_count();
        let mut input = Self {
            chunk: chunk.position(),
            job_type,
            chunk_size: size,
            max_iterations,
            seed,
            states: vec![UNCOLLAPSED; cell_count],
            entropy: vec![0; cell_count],
            possible_states: vec![UNCOLLAPSED; cell_count * MAX_STATES_PER_CELL],
            possible_counts: vec![0; cell_count],
            boundary: vec![false; cell_count],
            truncated_cells: 0,
        };

        for index in 0..cell_count {
            let Some(position) = chunk.local_position(index) else {
                continue;
            };
            if let Some(flag) = input.boundary.get_mut(index) {
                *flag = Direction::ALL
                    .iter()
                    .any(|direction| direction.is_on_face(position, size));
            }
            let Some(states) = chunk.states_at(position) else {
                continue;
            };
            if let Some(slot) = input.entropy.get_mut(index) {
                *slot = states.count() as i32;
            }
            if let (Some(slot), Some(state)) = (input.states.get_mut(index), states.sole()) {
                *slot = state as i32;
            }
            if states.count() > MAX_STATES_PER_CELL {
                input.truncated_cells += 1;
            }
            let base = index * MAX_STATES_PER_CELL;
            let mut used = 0;
            for (offset, state) in states.iter().take(MAX_STATES_PER_CELL).enumerate() {
                if let Some(slot) = input.possible_states.get_mut(base + offset) {
                    *slot = state as i32;
                    used += 1;
                }
            }
            if let Some(count) = input.possible_counts.get_mut(index) {
                *count = used;
            }
        }
        input
    }

    /// Number of cells in the snapshot
    pub fn cell_count(&self) -> usize {
        self.states.len()
    }
}

/// Result of a job, applied to the live chunk by the coordinator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutput {
    /// Chunk the job ran on
    pub chunk: ChunkPosition,
    /// Kind of work performed
    pub job_type: JobType,
    /// Final state per cell or [`UNCOLLAPSED`]
    pub states: Vec<i32>,
    /// Cells collapsed by the job in collapse order
    pub collapsed_cells: Vec<usize>,
    /// Selection iterations run
    pub iterations: usize,
}

impl JobOutput {
    /// Number of cells the job collapsed
    pub fn collapse_count(&self) -> usize {
        self.collapsed_cells.len()
    }
}

/// Run a job to completion on the calling thread
///
/// Repeatedly picks the uncollapsed cell with the fewest candidates (lowest
/// index on ties) and assigns it a uniformly random candidate. No adjacency
/// propagation happens here; boundary fix-ups run on the coordinator after
/// write-back.
pub fn run_job(input: &JobInput) -> JobOutput {
    let mut rng = StdRng::seed_from_u64(input.seed);
    let mut states = input.states.clone();
    let mut collapsed_cells = Vec::new();
    let mut iterations = 0;

    while iterations < input.max_iterations {
        let Some(index) = min_entropy_index(&states, &input.entropy, &input.possible_counts) else {
            break;
        };
        iterations += 1;
        let count = input.possible_counts.get(index).copied().unwrap_or(0);
        if count <= 0 {
            break;
        }
        let choice = rng.random_range(0..count) as usize;
        let state = input
            .possible_states
            .get(index * MAX_STATES_PER_CELL + choice)
            .copied()
            .unwrap_or(UNCOLLAPSED);
        if let Some(slot) = states.get_mut(index) {
            *slot = state;
        }
        collapsed_cells.push(index);
    }

    JobOutput {
        chunk: input.chunk,
        job_type: input.job_type,
        states,
        collapsed_cells,
        iterations,
    }
}

fn min_entropy_index(states: &[i32], entropy: &[i32], counts: &[i32]) -> Option<usize> {
    let mut best: Option<(i32, usize)> = None;
    for (index, (&state, &cell_entropy)) in states.iter().zip(entropy).enumerate() {
        let usable = counts.get(index).copied().unwrap_or(0) > 0;
        if state != UNCOLLAPSED || !usable {
            continue;
        }
        if best.is_none_or(|(best_entropy, _)| cell_entropy < best_entropy) {
            best = Some((cell_entropy, index));
        }
    }
    best.map(|(_, index)| index)
}
