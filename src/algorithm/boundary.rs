//! Boundary buffer protocol between face-adjacent chunks
//!
//! Every chunk keeps one [`BoundaryBuffer`] per face. A buffer lists the
//! owner's face cells in face-index order next to a mirror of the adjacent
//! chunk's touching face cells, so index `i` in both lists names the same
//! lattice seam. The [`BoundaryBufferManager`] pushes local changes into the
//! neighbor's mirror, filters the neighbor's real face cells by adjacency and
//! audits the seams. There is no cross-chunk lock: consistency comes from
//! applying an update after every local change plus periodic full resyncs.

use crate::algorithm::adjacency::AdjacencyRules;
use crate::algorithm::bitset::{StateId, StateSet};
use crate::algorithm::propagation::PropagationEvent;
use crate::spatial::chunk::ChunkPosition;
use crate::spatial::chunk_map::ChunkMap;
use crate::spatial::direction::Direction;
use log::{debug, warn};

/// Mirror of one chunk face and the neighbor face it touches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryBuffer {
    direction: Direction,
    owner: ChunkPosition,
    adjacent: Option<ChunkPosition>,
    boundary_cells: Vec<[usize; 3]>,
    buffer_states: Vec<StateSet>,
}

impl BoundaryBuffer {
    /// Create a buffer for the owner's face toward `direction`
    ///
    /// Mirror entries start empty until the first synchronization.
    pub fn new(
        owner: ChunkPosition,
        direction: Direction,
        adjacent: Option<ChunkPosition>,
        chunk_size: usize,
        state_capacity: usize,
    ) -> Self {
        let boundary_cells = direction.face_cells(chunk_size);
        let buffer_states = vec![StateSet::new(state_capacity); boundary_cells.len()];
        Self {
            direction,
            owner,
            adjacent,
            boundary_cells,
            buffer_states,
        }
    }

    /// Face this buffer covers
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Chunk owning the face cells
    pub const fn owner(&self) -> ChunkPosition {
        self.owner
    }

    /// Chunk across the face, absent at world edges
    pub const fn adjacent(&self) -> Option<ChunkPosition> {
        self.adjacent
    }

    /// Point the buffer at a new adjacent chunk
    pub const fn set_adjacent(&mut self, adjacent: Option<ChunkPosition>) {
        self.adjacent = adjacent;
    }

    /// Forget the adjacent chunk and clear the mirror
    pub fn detach(&mut self) {
        self.adjacent = None;
        for states in &mut self.buffer_states {
            states.clear();
        }
    }

    /// Number of face cells
    pub fn len(&self) -> usize {
        self.boundary_cells.len()
    }

    /// Whether the face holds no cells
    pub fn is_empty(&self) -> bool {
        self.boundary_cells.is_empty()
    }

    /// Owner face cells in face-index order
    pub fn boundary_cells(&self) -> &[[usize; 3]] {
        &self.boundary_cells
    }

    /// Mirrored neighbor states in face-index order
    pub fn buffer_states(&self) -> &[StateSet] {
        &self.buffer_states
    }

    /// Mirrored neighbor states at a face index
    pub fn buffer_state(&self, index: usize) -> Option<&StateSet> {
        self.buffer_states.get(index)
    }

    /// Overwrite a mirror entry, returning whether it changed
    pub fn set_buffer_state(&mut self, index: usize, states: &StateSet) -> bool {
        match self.buffer_states.get_mut(index) {
            Some(slot) if slot != states => {
                slot.copy_from(states);
                true
            }
            _ => false,
        }
    }
}

/// Collapsed boundary cell whose neighbor cannot accept its state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryConflict {
    /// Chunk owning the collapsed cell
    pub chunk: ChunkPosition,
    /// Face the conflict lies on
    pub direction: Direction,
    /// Local position of the collapsed cell
    pub cell: [usize; 3],
    /// State the cell collapsed to
    pub state: StateId,
    /// Chunk across the face
    pub neighbor: ChunkPosition,
    /// Local position of the touching neighbor cell
    pub neighbor_cell: [usize; 3],
    /// Remaining states of the neighbor cell
    pub neighbor_states: StateSet,
}

/// Counts from a synchronization pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Mirror entries that changed
    pub mirrored: usize,
    /// Local face cells whose states narrowed
    pub narrowed: usize,
    /// Face cells left with no compatible state
    pub conflicts: usize,
    /// Boundary events for narrowed cells
    pub events: Vec<PropagationEvent>,
}

impl SyncOutcome {
    fn absorb(&mut self, other: Self) {
        self.mirrored += other.mirrored;
        self.narrowed += other.narrowed;
        self.conflicts += other.conflicts;
        self.events.extend(other.events);
    }
}

/// Running totals of boundary traffic
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundaryStats {
    /// Buffer updates applied after local changes
    pub updates: usize,
    /// Neighbor cells narrowed by filtering
    pub narrowed_cells: usize,
    /// Filter results that would have emptied a cell
    pub conflicts: usize,
}

/// Applies the boundary buffer protocol across a chunk map
#[derive(Debug, Default)]
pub struct BoundaryBufferManager {
    /// Running totals
    pub stats: BoundaryStats,
}

impl BoundaryBufferManager {
    /// Create a manager with zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Install one buffer per face on a chunk, linked to its current neighbors
    ///
    /// Returns the number of buffers installed, zero if the chunk is not loaded.
    pub fn initialize_buffers(map: &mut ChunkMap, position: ChunkPosition) -> usize {
        let Some(chunk) = map.get_mut(position) else {
            return 0;
        };
        let size = chunk.size();
        let capacity = chunk.state_capacity();
        for direction in Direction::ALL {
            let adjacent = chunk.neighbor(direction);
            chunk.set_boundary_buffer(BoundaryBuffer::new(
                position, direction, adjacent, size, capacity,
            ));
        }
        Direction::COUNT
    }

    /// Install buffers on every loaded chunk
    pub fn initialize_all_buffers(map: &mut ChunkMap) -> usize {
        map.positions()
            .into_iter()
            .map(|position| Self::initialize_buffers(map, position))
            .sum()
    }

    /// Push a changed boundary cell across every face it lies on
    ///
    /// The cell's states are copied into the neighbor's mirror at the same
    /// face index and the neighbor's touching cell is filtered to compatible
    /// states. A neighbor cell narrowed to a single state yields a
    /// boundary-flagged event for the neighbor chunk.
    pub fn update_buffers_after_collapse(
        &mut self,
        map: &mut ChunkMap,
        rules: &AdjacencyRules,
        position: ChunkPosition,
        cell: [usize; 3],
    ) -> Vec<PropagationEvent> {
        let mut events = Vec::new();
        let Some(chunk) = map.get(position) else {
            return events;
        };
        let size = chunk.size();
        let Some(states) = chunk.states_at(cell) else {
            return events;
        };
        let faces: Vec<(Direction, ChunkPosition, usize)> = Direction::ALL
            .iter()
            .filter_map(|&direction| {
                let neighbor = chunk.neighbor(direction)?;
                let index = direction.face_index(cell, size)?;
                Some((direction, neighbor, index))
            })
            .collect();

        for (direction, neighbor_position, index) in faces {
            let Some(neighbor) = map.get_mut(neighbor_position) else {
                continue;
            };
            self.stats.updates += 1;
            let facing = direction.opposite();
            if let Some(buffer) = neighbor.boundary_buffer_mut(facing) {
                buffer.set_buffer_state(index, &states);
            }

            let Some(neighbor_cell) = facing.face_cell(index, neighbor.size()) else {
                continue;
            };
            let allowed = rules.compatible_with(&states, direction);
            let Some(target) = neighbor.cell_mut(neighbor_cell) else {
                continue;
            };
            let narrowed = target.possible_states().intersection(&allowed);
            if narrowed.is_empty() {
                if !target.possible_states().is_empty() {
                    self.stats.conflicts += 1;
                    warn!(
                        "Boundary conflict: {position} {cell:?} leaves no state for {neighbor_position} {neighbor_cell:?}"
                    );
                }
                continue;
            }
            let old_states = target.possible_states().clone();
            if target.set_possible_states(&narrowed) {
                self.stats.narrowed_cells += 1;
                if narrowed.count() == 1 {
                    events.push(PropagationEvent::new(
                        neighbor_position,
                        neighbor_cell,
                        old_states,
                        narrowed,
                        true,
                    ));
                }
            }
        }
        events
    }

    /// Pull the neighbor's face into the local mirror and re-filter local face cells
    ///
    /// Running it twice without other changes narrows nothing the second time.
    pub fn synchronize_buffer(
        &mut self,
        map: &mut ChunkMap,
        rules: &AdjacencyRules,
        position: ChunkPosition,
        direction: Direction,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let Some(neighbor_position) = map.get(position).and_then(|c| c.neighbor(direction)) else {
            return outcome;
        };
        let Some(neighbor) = map.get(neighbor_position) else {
            return outcome;
        };
        let facing = direction.opposite();
        let neighbor_size = neighbor.size();
        let mirror: Vec<Option<StateSet>> = (0..neighbor_size * neighbor_size)
            .map(|index| {
                facing
                    .face_cell(index, neighbor_size)
                    .and_then(|cell| neighbor.states_at(cell))
            })
            .collect();

        let Some(chunk) = map.get_mut(position) else {
            return outcome;
        };
        let size = chunk.size();
        if size != neighbor_size {
            warn!("Cannot synchronize {position} {direction}: chunk sizes differ");
            return outcome;
        }
        if let Some(buffer) = chunk.boundary_buffer_mut(direction) {
            buffer.set_adjacent(Some(neighbor_position));
            for (index, states) in mirror.iter().enumerate() {
                if let Some(states) = states
                    && buffer.set_buffer_state(index, states)
                {
                    outcome.mirrored += 1;
                }
            }
        }

        for (index, states) in mirror.into_iter().enumerate() {
            let (Some(states), Some(cell)) = (states, direction.face_cell(index, size)) else {
                continue;
            };
            if states.is_empty() {
                continue;
            }
            let allowed = rules.compatible_with(&states, facing);
            let Some(target) = chunk.cell_mut(cell) else {
                continue;
            };
            let narrowed = target.possible_states().intersection(&allowed);
            if narrowed.is_empty() {
                if !target.possible_states().is_empty() {
                    outcome.conflicts += 1;
                    warn!("Boundary conflict while synchronizing {position} {direction} at {cell:?}");
                }
                continue;
            }
            let old_states = target.possible_states().clone();
            if target.set_possible_states(&narrowed) {
                outcome.narrowed += 1;
                outcome.events.push(PropagationEvent::new(
                    position, cell, old_states, narrowed, true,
                ));
            }
        }

        self.stats.narrowed_cells += outcome.narrowed;
        self.stats.conflicts += outcome.conflicts;
        outcome
    }

    /// Synchronize every linked face of every loaded chunk once
    pub fn synchronize_all_buffers(
        &mut self,
        map: &mut ChunkMap,
        rules: &AdjacencyRules,
    ) -> SyncOutcome {
        let mut total = SyncOutcome::default();
        for position in map.positions() {
            let linked: Vec<Direction> = map
                .get(position)
                .map(|chunk| chunk.neighbors().into_iter().map(|(d, _)| d).collect())
                .unwrap_or_default();
            for direction in linked {
                total.absorb(self.synchronize_buffer(map, rules, position, direction));
            }
        }
        debug!(
            "Synchronized boundaries: {} mirrored, {} narrowed, {} conflicts",
            total.mirrored, total.narrowed, total.conflicts
        );
        total
    }

    /// Collapsed face cells whose neighbor cannot accept their state
    ///
    /// Read-only: neither chunk is restored or modified.
    pub fn find_conflicts(
        map: &ChunkMap,
        rules: &AdjacencyRules,
        position: ChunkPosition,
        direction: Direction,
    ) -> Vec<BoundaryConflict> {
        let Some(chunk) = map.get(position) else {
            return Vec::new();
        };
        let Some(neighbor_position) = chunk.neighbor(direction) else {
            return Vec::new();
        };
        let Some(neighbor) = map.get(neighbor_position) else {
            return Vec::new();
        };
        let size = chunk.size();
        let facing = direction.opposite();

        direction
            .face_cells(size)
            .into_iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let state = chunk.collapsed_state_at(cell)?;
                let neighbor_cell = facing.face_cell(index, neighbor.size())?;
                let neighbor_states = neighbor.states_at(neighbor_cell)?;
                if neighbor_states.is_empty() {
                    return None;
                }
                let accepted = match neighbor.collapsed_state_at(neighbor_cell) {
                    Some(other) => rules.are_states_compatible(state, other, direction),
                    None => neighbor_states
                        .iter()
                        .any(|other| rules.are_states_compatible(state, other, direction)),
                };
                (!accepted).then_some(BoundaryConflict {
                    chunk: position,
                    direction,
                    cell,
                    state,
                    neighbor: neighbor_position,
                    neighbor_cell,
                    neighbor_states,
                })
            })
            .collect()
    }

    /// Audit one face, logging each conflict
    ///
    /// Returns whether the face is conflict-free.
    pub fn validate_boundary(
        map: &ChunkMap,
        rules: &AdjacencyRules,
        position: ChunkPosition,
        direction: Direction,
    ) -> bool {
        let conflicts = Self::find_conflicts(map, rules, position, direction);
        for conflict in &conflicts {
            warn!(
                "Boundary conflict: {} {:?} state {} {} of it, {} {:?} holds {}",
                conflict.chunk,
                conflict.cell,
                conflict.state,
                conflict.direction,
                conflict.neighbor,
                conflict.neighbor_cell,
                conflict.neighbor_states
            );
        }
        conflicts.is_empty()
    }

    /// Audit every linked face of every loaded chunk
    pub fn validate_all_boundaries(map: &ChunkMap, rules: &AdjacencyRules) -> Vec<BoundaryConflict> {
        map.iter()
            .flat_map(|chunk| {
                chunk
                    .neighbors()
                    .into_iter()
                    .flat_map(|(direction, _)| {
                        Self::find_conflicts(map, rules, chunk.position(), direction)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
