//! Bounded scheduler running per-chunk collapse jobs on worker threads
//!
//! The coordinating thread owns every chunk. Jobs receive flat snapshots over
//! a task channel and send results back over a result channel; workers never
//! touch shared state. Completion is polled by [`ParallelWfcProcessor::update`].
//! Write-back happens in [`ParallelWfcProcessor::process_completed_jobs`] and
//! boundary follow-up in [`ParallelWfcProcessor::process_main_thread_events`],
//! both on the coordinator.

use crate::algorithm::bitset::StateSet;
use crate::algorithm::executor::{CollapseStats, WfcCore};
use crate::algorithm::propagation::PropagationEvent;
use crate::io::configuration::{
    DEFAULT_MAX_PENDING_JOBS, DEFAULT_SEED, DEFAULT_WRITE_BACK_STRIDE, default_parallelism,
};
use crate::io::error::{GenerationError, Result};
use crate::parallel::job::{JobInput, JobOutput, JobType, run_job};
use crate::spatial::chunk::ChunkPosition;
use crate::spatial::chunk_map::ChunkMap;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use std::cmp::Reverse;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BinaryHeap, HashMap};
use std::hash::{Hash, Hasher};
use std::thread::JoinHandle;

/// Scheduler limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Worker threads and the cap on running units
    pub max_threads: usize,
    /// Cap on units pending or running at once
    pub max_concurrent_chunks: usize,
    /// Hard cap on the pending queue
    pub max_pending_jobs: usize,
    /// Write back every n-th collapsed cell of a job
    pub write_back_stride: usize,
    /// Base seed job seeds are derived from
    pub seed: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_threads: default_parallelism(),
            max_concurrent_chunks: default_parallelism(),
            max_pending_jobs: DEFAULT_MAX_PENDING_JOBS,
            write_back_stride: DEFAULT_WRITE_BACK_STRIDE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Lifecycle of a queued chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    /// Waiting for a worker slot
    Pending,
    /// Sent to a worker
    Running,
    /// Result received, awaiting write-back
    Completed,
    /// Discarded without a result
    Failed,
}

/// Scheduler counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Units accepted
    pub queued: usize,
    /// Submissions refused
    pub rejected: usize,
    /// Units written back
    pub completed: usize,
    /// Units discarded
    pub failed: usize,
    /// Cells collapsed by write-back
    pub written_back_cells: usize,
    /// Boundary events handed to the coordinator queue
    pub boundary_events: usize,
}

#[derive(Debug)]
struct ProcessingUnit {
    state: UnitState,
    input: Option<JobInput>,
    output: Option<JobOutput>,
}

/// Schedules bounded concurrent collapse jobs and commits their results
pub struct ParallelWfcProcessor {
    config: ProcessorConfig,
    units: HashMap<ChunkPosition, ProcessingUnit>,
    pending: BinaryHeap<Reverse<(i32, u64, ChunkPosition)>>,
    next_sequence: u64,
    running: usize,
    task_sender: Option<Sender<JobInput>>,
    result_receiver: Receiver<JobOutput>,
    event_sender: Sender<PropagationEvent>,
    event_receiver: Receiver<PropagationEvent>,
    workers: Vec<JoinHandle<()>>,
    stats: ProcessorStats,
}

impl ParallelWfcProcessor {
    /// Start `max_threads` workers
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero or a worker thread cannot be spawned
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        for (parameter, value) in [
            ("max_threads", config.max_threads),
            ("max_concurrent_chunks", config.max_concurrent_chunks),
            ("max_pending_jobs", config.max_pending_jobs),
            ("write_back_stride", config.write_back_stride),
        ] {
            if value == 0 {
                return Err(crate::io::error::invalid_parameter(
                    parameter,
                    &value,
                    &"must be positive",
                ));
            }
        }

        let (task_sender, task_receiver) = unbounded::<JobInput>();
        let (result_sender, result_receiver) = unbounded::<JobOutput>();
        let (event_sender, event_receiver) = unbounded::<PropagationEvent>();

        let mut workers = Vec::with_capacity(config.max_threads);
        for index in 0..config.max_threads {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let handle = std::thread::Builder::new()
                .name(format!("wfc-worker-{index}"))
                .spawn(move || {
                    while let Ok(input) = receiver.recv() {
                        if sender.send(run_job(&input)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|source| GenerationError::WorkerSpawn { index, source })?;
            workers.push(handle);
        }
        debug!("Started {} collapse workers", workers.len());

        Ok(Self {
            config,
            units: HashMap::new(),
            pending: BinaryHeap::new(),
            next_sequence: 0,
            running: 0,
            task_sender: Some(task_sender),
            result_receiver,
            event_sender,
            event_receiver,
            workers,
            stats: ProcessorStats::default(),
        })
    }

    /// Scheduler limits in use
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Scheduler counters
    pub const fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Lifecycle state of a chunk's unit, if one is tracked
    pub fn unit_state(&self, position: ChunkPosition) -> Option<UnitState> {
        self.units.get(&position).map(|unit| unit.state)
    }

    /// Units waiting for a worker
    pub fn pending_count(&self) -> usize {
        self.count_in(UnitState::Pending)
    }

    /// Units sent to a worker
    pub const fn running_count(&self) -> usize {
        self.running
    }

    /// Units with a result awaiting write-back
    pub fn completed_count(&self) -> usize {
        self.count_in(UnitState::Completed)
    }

    fn count_in(&self, state: UnitState) -> usize {
        self.units.values().filter(|unit| unit.state == state).count()
    }

    /// Whether no unit is pending, running or awaiting write-back
    pub fn is_idle(&self) -> bool {
        self.units.is_empty()
    }

    /// Accept a chunk for processing, copying its cells into a job snapshot
    ///
    /// Lower `priority` runs first. Returns false when the chunk is already
    /// tracked, the concurrent-chunk cap is reached, the pending queue is full
    /// or the processor has stopped.
    pub fn queue_chunk_for_processing(
        &mut self,
        map: &ChunkMap,
        position: ChunkPosition,
        job_type: JobType,
        max_iterations: usize,
        priority: i32,
    ) -> bool {
        let Some(chunk) = map.get(position) else {
            self.stats.rejected += 1;
            return false;
        };
        let active = self.pending_count() + self.running;
        if self.task_sender.is_none()
            || self.units.contains_key(&position)
            || active >= self.config.max_concurrent_chunks
            || self.pending_count() >= self.config.max_pending_jobs
        {
            self.stats.rejected += 1;
            debug!("Rejected chunk {position}: {active} active units");
            return false;
        }

        let seed = job_seed(self.config.seed, position);
        let input = JobInput::from_chunk(chunk, job_type, max_iterations, seed);
        if input.truncated_cells > 0 {
            warn!(
                "Chunk {position}: {} cells exceed the per-cell state limit, extra states dropped",
                input.truncated_cells
            );
        }
        self.units.insert(
            position,
            ProcessingUnit {
                state: UnitState::Pending,
                input: Some(input),
                output: None,
            },
        );
        self.pending
            .push(Reverse((priority, self.next_sequence, position)));
        self.next_sequence += 1;
        self.stats.queued += 1;
        true
    }

    /// Run one scheduling pass and one reaping pass
    ///
    /// Promotes pending units to running while worker slots are free and
    /// marks units whose results arrived as completed. Units whose chunk is
    /// no longer loaded fail and are discarded.
    pub fn update(&mut self, map: &ChunkMap) {
        self.schedule(map);
        self.reap();
    }

    fn schedule(&mut self, map: &ChunkMap) {
        while self.running < self.config.max_threads {
            let Some(Reverse((_, _, position))) = self.pending.pop() else {
                break;
            };
            if self.unit_state(position) != Some(UnitState::Pending) {
                continue;
            }
            if !map.contains(position) {
                warn!("Chunk {position} vanished before its job started");
                self.fail(position);
                continue;
            }
            let Some(input) = self.units.get_mut(&position).and_then(|unit| unit.input.take())
            else {
                self.fail(position);
                continue;
            };
            let sent = self
                .task_sender
                .as_ref()
                .is_some_and(|sender| sender.send(input).is_ok());
            if !sent {
                warn!("Worker pool closed, dropping chunk {position}");
                self.fail(position);
                continue;
            }
            if let Some(unit) = self.units.get_mut(&position) {
                unit.state = UnitState::Running;
            }
            self.running += 1;
            debug!("Scheduled chunk {position}");
        }
    }

    fn reap(&mut self) {
        while let Ok(output) = self.result_receiver.try_recv() {
            self.running = self.running.saturating_sub(1);
            match self.units.get_mut(&output.chunk) {
                Some(unit) if unit.state == UnitState::Running => {
                    unit.state = UnitState::Completed;
                    unit.output = Some(output);
                }
                _ => debug!("Discarding result for untracked chunk {}", output.chunk),
            }
        }
    }

    fn fail(&mut self, position: ChunkPosition) {
        if let Some(mut unit) = self.units.remove(&position) {
            unit.state = UnitState::Failed;
            self.stats.failed += 1;
        }
    }

    /// Write completed job results into their chunks
    ///
    /// Every `write_back_stride`-th collapsed cell is committed. Full-collapse
    /// jobs mark their chunk fully collapsed. Boundary cells that collapsed
    /// are handed to the coordinator event queue. Returns the number of units
    /// committed.
    pub fn process_completed_jobs(&mut self, map: &mut ChunkMap) -> usize {
        let mut completed: Vec<ChunkPosition> = self
            .units
            .iter()
            .filter(|(_, unit)| unit.state == UnitState::Completed)
            .map(|(&position, _)| position)
            .collect();
        completed.sort_unstable();

        let mut committed = 0;
        for position in completed {
            let Some(output) = self.units.remove(&position).and_then(|unit| unit.output) else {
                continue;
            };
            let Some(chunk) = map.get_mut(position) else {
                warn!("Chunk {position} vanished before write-back");
                self.stats.failed += 1;
                continue;
            };

            let capacity = chunk.state_capacity();
            let mut written = 0;
            for &index in output.collapsed_cells.iter().step_by(self.config.write_back_stride) {
                let (Some(cell_position), Some(&state)) =
                    (chunk.local_position(index), output.states.get(index))
                else {
                    continue;
                };
                let Ok(state) = usize::try_from(state) else {
                    continue;
                };
                let Some(cell) = chunk.cell_mut(cell_position) else {
                    continue;
                };
                let old_states = cell.possible_states().clone();
                if !cell.collapse(state) {
                    warn!("Chunk {position}: rejected write-back of state {state} at {cell_position:?}");
                    continue;
                }
                written += 1;
                if cell.is_boundary() {
                    let event = PropagationEvent::new(
                        position,
                        cell_position,
                        old_states,
                        StateSet::singleton(capacity, state),
                        true,
                    );
                    if self.event_sender.send(event).is_ok() {
                        self.stats.boundary_events += 1;
                    }
                }
            }

            if output.job_type == JobType::FullCollapse {
                chunk.set_fully_collapsed(true);
            }
            self.stats.written_back_cells += written;
            self.stats.completed += 1;
            committed += 1;
            debug!(
                "Committed chunk {position}: {written} of {} collapses written back",
                output.collapse_count()
            );
        }
        committed
    }

    /// Drain the coordinator event queue into the core and propagate
    pub fn process_main_thread_events(
        &mut self,
        core: &mut WfcCore,
        map: &mut ChunkMap,
        max_steps: usize,
    ) -> CollapseStats {
        let mut drained = 0;
        while let Ok(event) = self.event_receiver.try_recv() {
            core.add_propagation_event(event);
            drained += 1;
        }
        if drained == 0 && core.pending_events() == 0 {
            return CollapseStats::default();
        }
        core.propagate(map, max_steps)
    }

    /// Drive scheduling and write-back until every tracked unit is committed
    ///
    /// Returns the number of units committed.
    pub fn run_until_idle(&mut self, core: &mut WfcCore, map: &mut ChunkMap, max_steps: usize) -> usize {
        let mut committed = 0;
        while !self.is_idle() && self.task_sender.is_some() {
            self.update(map);
            committed += self.process_completed_jobs(map);
            self.process_main_thread_events(core, map, max_steps);
            if self.running > 0 && self.completed_count() == 0 {
                std::thread::yield_now();
            }
        }
        committed
    }

    /// Cancel every outstanding unit and join every worker
    ///
    /// Pending, running and uncommitted completed units are all counted as
    /// failed. Running units finish on their worker and their results are
    /// dropped.
    pub fn stop(&mut self) {
        let pending = self.pending_count();
        let running = self.count_in(UnitState::Running);
        let uncommitted = self.completed_count();
        let cancelled = self.units.len();
        self.pending.clear();
        self.units.clear();
        self.stats.failed += cancelled;
        self.task_sender = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("Collapse worker panicked during shutdown");
            }
        }
        self.running = 0;
        while self.result_receiver.try_recv().is_ok() {}
        if cancelled > 0 {
            debug!(
                "Processor stopped: {pending} pending, {running} running and {uncommitted} uncommitted units cancelled"
            );
        }
    }
}

impl Drop for ParallelWfcProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Seed for a chunk's job derived from the base seed and the chunk position
pub fn job_seed(seed: u64, position: ChunkPosition) -> u64 {
    let mut hasher = DefaultHasher::new();
    position.hash(&mut hasher);
    seed ^ hasher.finish()
}
