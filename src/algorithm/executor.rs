use crate::algorithm::adjacency::AdjacencyRules;
use crate::algorithm::bitset::{StateId, StateSet};
use crate::algorithm::boundary::{BoundaryBufferManager, BoundaryConflict, SyncOutcome};
use crate::algorithm::propagation::{PropagationEvent, PropagationQueue, propagate_event};
use crate::algorithm::selection::select_min_entropy_cell;
use crate::constraints::hierarchy::HierarchicalConstraintSystem;
use crate::io::error::{GenerationError, Result};
use crate::spatial::chunk::ChunkPosition;
use crate::spatial::chunk_map::ChunkMap;
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seeded random selector for reproducible stochastic choices
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a deterministic random selector
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generic weighted random selection
    ///
    /// Returns index into weights array using cumulative distribution
    pub fn weighted_choice(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }

        let mut rand_val = self.rng.random::<f64>() * total;
        for (i, &weight) in weights.iter().enumerate() {
            rand_val -= weight;
            if rand_val <= 0.0 {
                return i;
            }
        }
        weights.len().saturating_sub(1)
    }
}

/// Counts gathered while collapsing or propagating
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollapseStats {
    /// Selection iterations run
    pub iterations: usize,
    /// Cells collapsed by selection
    pub collapses: usize,
    /// Collapses forced by dominant constraint weights
    pub forced_collapses: usize,
    /// Propagation events processed
    pub propagation_steps: usize,
    /// Narrowings rejected because they would empty a cell
    pub contradictions: usize,
    /// Boundary events raised in neighbor chunks
    pub boundary_events: usize,
}

impl CollapseStats {
    /// Add another set of counts to these
    pub const fn merge(&mut self, other: &Self) {
        self.iterations += other.iterations;
        self.collapses += other.collapses;
        self.forced_collapses += other.forced_collapses;
        self.propagation_steps += other.propagation_steps;
        self.contradictions += other.contradictions;
        self.boundary_events += other.boundary_events;
    }
}

/// Per-chunk collapse and propagation driver
///
/// Owns the adjacency rules, the propagation worklist and the boundary
/// manager. Every state change, whether from local selection, boundary
/// filtering or a parallel job write-back, enters the worklist through
/// [`WfcCore::add_propagation_event`].
pub struct WfcCore {
    rules: AdjacencyRules,
    queue: PropagationQueue,
    boundary: BoundaryBufferManager,
    random_selector: RandomSelector,
    /// Totals over every chunk collapse run by this core
    pub stats: CollapseStats,
}

impl WfcCore {
    /// Create a core for a rule set with a seeded selector
    pub fn new(rules: AdjacencyRules, seed: u64) -> Self {
        Self {
            rules,
            queue: PropagationQueue::new(),
            boundary: BoundaryBufferManager::new(),
            random_selector: RandomSelector::new(seed),
            stats: CollapseStats::default(),
        }
    }

    /// Adjacency rules in use
    pub const fn rules(&self) -> &AdjacencyRules {
        &self.rules
    }

    /// Boundary manager and its statistics
    pub const fn boundary(&self) -> &BoundaryBufferManager {
        &self.boundary
    }

    /// Mutable boundary manager for explicit synchronization passes
    pub const fn boundary_mut(&mut self) -> &mut BoundaryBufferManager {
        &mut self.boundary
    }

    /// Number of events waiting in the worklist
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a state change for propagation
    pub fn add_propagation_event(&mut self, event: PropagationEvent) {
        self.queue.push(event);
    }

    /// Drop every pending event
    pub fn clear_events(&mut self) {
        self.queue.clear();
    }

    /// Fill a chunk's cells with every state and install its boundary buffers
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk is not loaded
    pub fn initialize_chunk(&self, map: &mut ChunkMap, position: ChunkPosition) -> Result<usize> {
        let candidates = self.rules.all_states();
        let chunk = map
            .get_mut(position)
            .ok_or(GenerationError::ChunkNotFound { position })?;
        let initialized = chunk.initialize_cells(&candidates);
        BoundaryBufferManager::initialize_buffers(map, position);
        Ok(initialized)
    }

    /// Collapse a chunk under its LOD iteration budget
    ///
    /// Each iteration selects the minimum-entropy cell, collapses it and
    /// propagates the change. The chunk is marked fully collapsed when every
    /// cell collapsed or the budget ran out.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk is not loaded
    pub fn collapse_chunk(
        &mut self,
        map: &mut ChunkMap,
        constraints: &mut HierarchicalConstraintSystem,
        position: ChunkPosition,
    ) -> Result<CollapseStats> {
        let lod = map
            .get(position)
            .ok_or(GenerationError::ChunkNotFound { position })?
            .lod();
        let budget = lod.max_iterations;
        let mut run = CollapseStats::default();

        while run.iterations < budget {
            let Some(cell) = map
                .get_mut(position)
                .and_then(|chunk| select_min_entropy_cell(chunk.dense_cells()))
            else {
                break;
            };
            run.iterations += 1;

            if self
                .collapse_cell(map, constraints, position, cell, lod.constraint_influence, &mut run)
                .is_some()
            {
                let propagated = self.propagate(map, budget);
                run.merge(&propagated);
            }
        }

        if let Some(chunk) = map.get_mut(position) {
            let complete = chunk.all_cells_collapsed();
            chunk.set_fully_collapsed(complete || run.iterations >= budget);
            debug!(
                "Collapsed chunk {position}: {} iterations, {} collapses ({} forced), {} contradictions, complete: {complete}",
                run.iterations, run.collapses, run.forced_collapses, run.contradictions
            );
        }
        self.stats.merge(&run);
        Ok(run)
    }

    /// Collapse one cell by constraint force or weighted sampling
    ///
    /// Enqueues the resulting event.
    fn collapse_cell(
        &mut self,
        map: &mut ChunkMap,
        constraints: &mut HierarchicalConstraintSystem,
        position: ChunkPosition,
        cell_position: [usize; 3],
        influence: f64,
        run: &mut CollapseStats,
    ) -> Option<StateId> {
        let chunk = map.get_mut(position)?;
        let size = chunk.size();
        let cell = chunk.cell_mut(cell_position)?;
        let old_states = cell.possible_states().clone();

        let weighted =
            constraints.weighted_states(&old_states, position, cell_position, size, influence);
        let state = if let Some(forced) =
            HierarchicalConstraintSystem::apply_weighted_to_cell(cell, &weighted)
        {
            run.forced_collapses += 1;
            forced
        } else {
            let index = self.random_selector.weighted_choice(&weighted.weights);
            let choice = weighted.states.get(index).copied()?;
            if !cell.collapse(choice) {
                return None;
            }
            choice
        };
        run.collapses += 1;

        let is_boundary = cell.is_boundary();
        let new_states = StateSet::singleton(old_states.capacity(), state);
        self.queue.push(PropagationEvent::new(
            position,
            cell_position,
            old_states,
            new_states,
            is_boundary,
        ));
        Some(state)
    }

    fn push_across_boundary(
        &mut self,
        map: &mut ChunkMap,
        position: ChunkPosition,
        cell: [usize; 3],
        run: &mut CollapseStats,
    ) {
        let events = self
            .boundary
            .update_buffers_after_collapse(map, &self.rules, position, cell);
        run.boundary_events += events.len();
        for event in events {
            self.queue.push(event);
        }
    }

    /// Drain the worklist in priority order for at most `max_steps` events
    ///
    /// Boundary events are pushed across their chunk faces before their
    /// in-chunk neighbors are filtered. Events left over when the budget runs
    /// out stay queued.
    pub fn propagate(&mut self, map: &mut ChunkMap, max_steps: usize) -> CollapseStats {
        let mut run = CollapseStats::default();
        while run.propagation_steps < max_steps {
            let Some(event) = self.queue.pop() else {
                break;
            };
            run.propagation_steps += 1;
            if event.is_boundary {
                self.push_across_boundary(map, event.chunk, event.cell, &mut run);
            }
            let Some(chunk) = map.get_mut(event.chunk) else {
                continue;
            };
            let step = propagate_event(chunk, &self.rules, &event);
            run.contradictions += step.contradictions;
            for next in step.events {
                self.queue.push(next);
            }
        }
        run
    }

    /// Synchronize every linked face once and queue the resulting events
    ///
    /// The returned outcome keeps its counts; its events have moved to the
    /// worklist.
    pub fn synchronize_boundaries(&mut self, map: &mut ChunkMap) -> SyncOutcome {
        let mut outcome = self.boundary.synchronize_all_buffers(map, &self.rules);
        for event in outcome.events.drain(..) {
            self.queue.push(event);
        }
        outcome
    }

    /// Audit every linked face against the rules in use
    pub fn validate_boundaries(&self, map: &ChunkMap) -> Vec<BoundaryConflict> {
        BoundaryBufferManager::validate_all_boundaries(map, &self.rules)
    }

    /// Collapse every loaded chunk in ascending position order
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk disappears mid-run
    pub fn collapse_all(
        &mut self,
        map: &mut ChunkMap,
        constraints: &mut HierarchicalConstraintSystem,
    ) -> Result<CollapseStats> {
        let mut total = CollapseStats::default();
        for position in map.positions() {
            total.merge(&self.collapse_chunk(map, constraints, position)?);
        }
        Ok(total)
    }
}
