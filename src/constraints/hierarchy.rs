//! Combination of global and region constraints into per-cell biases
//!
//! The bias for a (chunk, local position, state) triple is the sum of every
//! global and region contribution. Consumers clamp it to [-1, 1]. Global
//! contributions are cached per chunk as a `[x, y, z, state]` volume tagged
//! with the constraint version; every add, remove or clear bumps the version.

use crate::algorithm::bitset::{StateId, StateSet};
use crate::algorithm::cache::{BiasCache, CacheStats};
use crate::algorithm::selection::WeightedStates;
use crate::constraints::global::GlobalConstraint;
use crate::constraints::region::RegionConstraint;
use crate::spatial::cell::Cell;
use crate::spatial::chunk::ChunkPosition;
use log::debug;
use ndarray::Array4;

/// Ordered global and region constraints with a versioned bias cache
#[derive(Debug)]
pub struct HierarchicalConstraintSystem {
    state_count: usize,
    global_constraints: Vec<GlobalConstraint>,
    region_constraints: Vec<RegionConstraint>,
    version: u64,
    cache: BiasCache,
}

impl HierarchicalConstraintSystem {
    /// Create an empty system for `state_count` states
    pub fn new(state_count: usize) -> Self {
        Self {
            state_count,
            global_constraints: Vec::new(),
            region_constraints: Vec::new(),
            version: 0,
            cache: BiasCache::new(),
        }
    }

    /// Number of states biases are produced for
    pub const fn state_count(&self) -> usize {
        self.state_count
    }

    /// Version counter, bumped on every mutation
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Registered global constraints in insertion order
    pub fn global_constraints(&self) -> &[GlobalConstraint] {
        &self.global_constraints
    }

    /// Registered region constraints in insertion order
    pub fn region_constraints(&self) -> &[RegionConstraint] {
        &self.region_constraints
    }

    /// Cache hit and miss counts
    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats
    }

    /// Whether no constraint is registered
    pub fn is_empty(&self) -> bool {
        self.global_constraints.is_empty() && self.region_constraints.is_empty()
    }

    fn bump_version(&mut self) {
        self.version += 1;
        let dropped = self.cache.prune_stale(self.version);
        if dropped > 0 {
            debug!("Dropped {dropped} cached bias volumes after constraint change");
        }
    }

    /// Number of chunks with a cached bias volume
    pub fn cached_chunks(&self) -> usize {
        self.cache.len()
    }

    /// Release the cached bias volume of a chunk leaving the world
    ///
    /// Returns whether a volume was cached.
    pub fn evict_chunk(&mut self, chunk: ChunkPosition) -> bool {
        self.cache.evict(chunk)
    }

    /// Append a global constraint
    pub fn add_global_constraint(&mut self, constraint: GlobalConstraint) {
        debug!("Adding global constraint '{}'", constraint.name);
        self.global_constraints.push(constraint);
        self.bump_version();
    }

    /// Remove every global constraint with the given name
    ///
    /// Returns whether anything was removed.
    pub fn remove_global_constraint(&mut self, name: &str) -> bool {
        let before = self.global_constraints.len();
        self.global_constraints.retain(|c| c.name != name);
        let removed = self.global_constraints.len() != before;
        if removed {
            self.bump_version();
        }
        removed
    }

    /// Append a region constraint
    pub fn add_region_constraint(&mut self, constraint: RegionConstraint) {
        debug!("Adding region constraint '{}'", constraint.name);
        self.region_constraints.push(constraint);
        self.bump_version();
    }

    /// Remove every region constraint with the given name
    ///
    /// Returns whether anything was removed.
    pub fn remove_region_constraint(&mut self, name: &str) -> bool {
        let before = self.region_constraints.len();
        self.region_constraints.retain(|c| c.name != name);
        let removed = self.region_constraints.len() != before;
        if removed {
            self.bump_version();
        }
        removed
    }

    /// Remove every constraint
    pub fn clear(&mut self) {
        self.global_constraints.clear();
        self.region_constraints.clear();
        self.bump_version();
    }

    /// Global contributions for every cell of a chunk, built on first use
    pub fn global_biases_for_chunk(
        &mut self,
        chunk: ChunkPosition,
        chunk_size: usize,
    ) -> &Array4<f64> {
        let shape = (chunk_size, chunk_size, chunk_size, self.state_count);
        if self
            .cache
            .peek(chunk, self.version)
            .is_some_and(|volume| volume.dim() != shape)
        {
            self.cache.evict(chunk);
        }

        let globals = &self.global_constraints;
        let state_count = self.state_count;
        self.cache.get_or_compute(chunk, self.version, || {
            let mut volume = Array4::zeros(shape);
            if globals.is_empty() {
                return volume;
            }
            let mut biases = vec![0.0; state_count];
            for x in 0..chunk_size {
                for y in 0..chunk_size {
                    for z in 0..chunk_size {
                        let world = chunk.world_position(chunk_size, [x, y, z]).map(|v| v as f64);
                        biases.fill(0.0);
                        for constraint in globals {
                            constraint.accumulate_biases(world, &mut biases);
                        }
                        for (state, &bias) in biases.iter().enumerate() {
                            if let Some(slot) = volume.get_mut([x, y, z, state]) {
                                *slot = bias;
                            }
                        }
                    }
                }
            }
            volume
        })
    }

    /// Unclamped summed bias of every state at a cell
    pub fn state_biases(
        &mut self,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
    ) -> Vec<f64> {
        let [x, y, z] = local;
        let state_count = self.state_count;
        let volume = self.global_biases_for_chunk(chunk, chunk_size);
        let mut biases: Vec<f64> = (0..state_count)
            .map(|state| volume.get([x, y, z, state]).copied().unwrap_or(0.0))
            .collect();
        for region in &self.region_constraints {
            region.accumulate_biases(chunk, local, chunk_size, &mut biases);
        }
        biases
    }

    /// Unclamped summed bias of one state at a cell
    pub fn state_bias(
        &mut self,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
        state: StateId,
    ) -> f64 {
        self.state_biases(chunk, local, chunk_size)
            .get(state)
            .copied()
            .unwrap_or(0.0)
    }

    /// Selection weights for the candidate states of a cell
    pub fn weighted_states(
        &mut self,
        states: &StateSet,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
        influence: f64,
    ) -> WeightedStates {
        let biases = self.state_biases(chunk, local, chunk_size);
        WeightedStates::from_biases(states.to_vec(), &biases, influence)
    }

    /// Force-collapse a cell when one state dominates its weights
    ///
    /// Returns the forced state, or `None` with the cell left unchanged.
    pub fn apply_constraints_to_cell(
        &mut self,
        cell: &mut Cell,
        chunk: ChunkPosition,
        chunk_size: usize,
        influence: f64,
    ) -> Option<StateId> {
        if cell.is_collapsed() || cell.entropy() == 0 {
            return None;
        }
        let weighted = self.weighted_states(
            cell.possible_states(),
            chunk,
            cell.position(),
            chunk_size,
            influence,
        );
        Self::apply_weighted_to_cell(cell, &weighted)
    }

    /// Force-collapse a cell from weights already computed for it
    ///
    /// Returns the forced state, or `None` with the cell left unchanged.
    pub fn apply_weighted_to_cell(cell: &mut Cell, weighted: &WeightedStates) -> Option<StateId> {
        if cell.is_collapsed() || cell.entropy() == 0 {
            return None;
        }
        let state = weighted.forced_state()?;
        cell.collapse(state).then_some(state)
    }
}
