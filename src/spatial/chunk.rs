//! Cubic chunk lattice with boundary buffers, LOD knobs and compressed storage
//!
//! A chunk owns `size³` cells in a dense [`Array3`]. A collapsed or partially
//! collapsed chunk can swap that array for a compact representation: a dense
//! array of collapsed state ids, or a sparse list of collapsed cells. Exactly one
//! representation is live at a time and any cell access restores the dense form
//! first.

use crate::algorithm::bitset::{StateId, StateSet};
use crate::algorithm::boundary::BoundaryBuffer;
use crate::io::configuration::{DEFAULT_CONSTRAINT_INFLUENCE, DEFAULT_MAX_ITERATIONS};
use crate::spatial::cell::Cell;
use crate::spatial::direction::Direction;
use ndarray::Array3;
use std::collections::BTreeMap;
use std::fmt;

/// Integer chunk coordinates in chunk space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPosition {
    /// Chunk X coordinate
    pub x: i32,
    /// Chunk Y coordinate
    pub y: i32,
    /// Chunk Z coordinate
    pub z: i32,
}

impl ChunkPosition {
    /// Create a chunk position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position of the adjacent chunk across a face
    pub const fn neighbor(self, direction: Direction) -> Self {
        let offset = direction.offset();
        Self {
            x: self.x + offset[0],
            y: self.y + offset[1],
            z: self.z + offset[2],
        }
    }

    /// Coordinates as an array
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// World-space coordinates of this chunk's local origin cell
    pub const fn world_origin(self, chunk_size: usize) -> [i64; 3] {
        let size = chunk_size as i64;
        [
            self.x as i64 * size,
            self.y as i64 * size,
            self.z as i64 * size,
        ]
    }

    /// World-space coordinates of a chunk-local cell
    pub const fn world_position(self, chunk_size: usize, local: [usize; 3]) -> [i64; 3] {
        let origin = self.world_origin(chunk_size);
        [
            origin[0] + local[0] as i64,
            origin[1] + local[1] as i64,
            origin[2] + local[2] as i64,
        ]
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Quality tier knobs a LOD policy sets before collapse
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSettings {
    /// LOD level (0 = full detail)
    pub level: u8,
    /// Iteration budget for collapse and for each propagation pass
    pub max_iterations: usize,
    /// Multiplier applied to constraint biases before clamping
    pub constraint_influence: f64,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            level: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            constraint_influence: DEFAULT_CONSTRAINT_INFLUENCE,
        }
    }
}

impl LodSettings {
    /// Derive settings for a level from a full-detail iteration budget
    ///
    /// Each level halves the budget and weakens constraint influence.
    pub fn for_level(level: u8, base_iterations: usize) -> Self {
        let shift = u32::from(level).min(usize::BITS - 1);
        Self {
            level,
            max_iterations: (base_iterations >> shift).max(1),
            constraint_influence: DEFAULT_CONSTRAINT_INFLUENCE / (1.0 + f64::from(level)),
        }
    }
}

/// Compact replacement for the dense cells
#[derive(Clone, Debug)]
enum CompactCells {
    Collapsed(Array3<StateId>),
    Sparse(Vec<([usize; 3], StateId)>),
}

/// Cubic lattice of cells forming one unit of parallel work
#[derive(Clone, Debug)]
pub struct Chunk {
    position: ChunkPosition,
    size: usize,
    state_capacity: usize,
    candidates: StateSet,
    cells: Array3<Cell>,
    compact: Option<CompactCells>,
    neighbors: [Option<ChunkPosition>; Direction::COUNT],
    boundary_buffers: BTreeMap<Direction, BoundaryBuffer>,
    fully_collapsed: bool,
    dirty: bool,
    lod: LodSettings,
}

impl Chunk {
    /// Create a chunk of uninitialized cells
    ///
    /// Face cells are flagged as boundary cells with the first face they touch.
    pub fn new(position: ChunkPosition, size: usize, state_capacity: usize) -> Self {
        Self {
            position,
            size,
            state_capacity,
            candidates: StateSet::new(state_capacity),
            cells: Self::build_cells(size, state_capacity),
            compact: None,
            neighbors: [None; Direction::COUNT],
            boundary_buffers: BTreeMap::new(),
            fully_collapsed: false,
            dirty: false,
            lod: LodSettings::default(),
        }
    }

    fn build_cells(size: usize, state_capacity: usize) -> Array3<Cell> {
        Array3::from_shape_fn((size, size, size), |(x, y, z)| {
            let position = [x, y, z];
            let mut cell = Cell::new(position, state_capacity);
            for direction in Direction::ALL {
                if direction.is_on_face(position, size) {
                    cell.mark_boundary(direction);
                }
            }
            cell
        })
    }

    /// Chunk-space position
    pub const fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Edge length in cells
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of state ids cells may hold
    pub const fn state_capacity(&self) -> usize {
        self.state_capacity
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.size * self.size * self.size
    }

    /// Candidate states cells were initialized with
    pub const fn candidates(&self) -> &StateSet {
        &self.candidates
    }

    /// Whether `initialize_cells` has run
    pub fn is_initialized(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Row-major flattened index of a local position
    pub fn local_index(&self, position: [usize; 3]) -> Option<usize> {
        let [x, y, z] = position;
        (x < self.size && y < self.size && z < self.size)
            .then(|| (x * self.size + y) * self.size + z)
    }

    /// Local position of a row-major flattened index
    pub fn local_position(&self, index: usize) -> Option<[usize; 3]> {
        if index >= self.cell_count() {
            return None;
        }
        let z = index % self.size;
        let y = (index / self.size) % self.size;
        let x = index / (self.size * self.size);
        Some([x, y, z])
    }

    /// Populate every uncollapsed cell with the full candidate set
    ///
    /// Returns the number of cells initialized.
    pub fn initialize_cells(&mut self, candidates: &StateSet) -> usize {
        self.restore();
        self.candidates = candidates.clone();
        self.fully_collapsed = false;
        self.dirty = true;
        self.cells
            .iter_mut()
            .map(|cell| cell.initialize(candidates))
            .filter(|&initialized| initialized)
            .count()
    }

    /// Read a cell, restoring the dense representation if needed
    pub fn cell(&mut self, position: [usize; 3]) -> Option<&Cell> {
        self.restore();
        self.cells.get(position)
    }

    /// Mutably access a cell, restoring the dense representation if needed
    pub fn cell_mut(&mut self, position: [usize; 3]) -> Option<&mut Cell> {
        self.restore();
        self.dirty = true;
        self.cells.get_mut(position)
    }

    /// Dense cells when the dense representation is live
    pub fn cells_if_dense(&self) -> Option<&Array3<Cell>> {
        self.compact.is_none().then_some(&self.cells)
    }

    /// Dense cells, restoring them if needed
    pub fn dense_cells(&mut self) -> &Array3<Cell> {
        self.restore();
        &self.cells
    }

    /// Collapsed state of a cell without restoring the dense representation
    pub fn collapsed_state_at(&self, position: [usize; 3]) -> Option<StateId> {
        match &self.compact {
            None => self.cells.get(position).and_then(Cell::collapsed_state),
            Some(CompactCells::Collapsed(states)) => states.get(position).copied(),
            Some(CompactCells::Sparse(entries)) => entries
                .iter()
                .find(|(entry_position, _)| *entry_position == position)
                .map(|&(_, state)| state),
        }
    }

    /// Possible states of a cell without restoring the dense representation
    ///
    /// Uncollapsed cells of a sparse chunk report the candidate set.
    pub fn states_at(&self, position: [usize; 3]) -> Option<StateSet> {
        self.local_index(position)?;
        if self.compact.is_none() {
            return self.cells.get(position).map(|c| c.possible_states().clone());
        }
        Some(self.collapsed_state_at(position).map_or_else(
            || self.candidates.clone(),
            |state| StateSet::singleton(self.state_capacity, state),
        ))
    }

    /// All collapsed cells in row-major order
    pub fn collapsed_cells(&self) -> Vec<([usize; 3], StateId)> {
        match &self.compact {
            None => self
                .cells
                .iter()
                .filter_map(|cell| cell.collapsed_state().map(|state| (cell.position(), state)))
                .collect(),
            Some(CompactCells::Collapsed(states)) => states
                .indexed_iter()
                .map(|((x, y, z), &state)| ([x, y, z], state))
                .collect(),
            Some(CompactCells::Sparse(entries)) => entries.clone(),
        }
    }

    /// Number of collapsed cells
    pub fn collapsed_count(&self) -> usize {
        match &self.compact {
            None => self.cells.iter().filter(|cell| cell.is_collapsed()).count(),
            Some(CompactCells::Collapsed(states)) => states.len(),
            Some(CompactCells::Sparse(entries)) => entries.len(),
        }
    }

    /// Whether every cell holds a collapsed state
    pub fn all_cells_collapsed(&self) -> bool {
        self.collapsed_count() == self.cell_count()
    }

    /// Completion flag set by collapse runs and full-collapse jobs
    pub const fn is_fully_collapsed(&self) -> bool {
        self.fully_collapsed
    }

    /// Set the completion flag
    pub const fn set_fully_collapsed(&mut self, fully_collapsed: bool) {
        self.fully_collapsed = fully_collapsed;
    }

    /// Whether cells changed since the flag was last cleared
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the chunk as changed
    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the changed flag, typically after a consumer rebuilt geometry
    pub const fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Current LOD settings
    pub const fn lod(&self) -> LodSettings {
        self.lod
    }

    /// Replace the LOD settings
    pub const fn set_lod(&mut self, lod: LodSettings) {
        self.lod = lod;
    }

    /// Linked neighbor across a face
    pub fn neighbor(&self, direction: Direction) -> Option<ChunkPosition> {
        self.neighbors.get(direction.index()).copied().flatten()
    }

    /// Link or unlink a neighbor across a face
    pub fn set_neighbor(&mut self, direction: Direction, neighbor: Option<ChunkPosition>) {
        if let Some(slot) = self.neighbors.get_mut(direction.index()) {
            *slot = neighbor;
        }
    }

    /// Linked neighbors in direction order
    pub fn neighbors(&self) -> Vec<(Direction, ChunkPosition)> {
        Direction::ALL
            .iter()
            .filter_map(|&direction| self.neighbor(direction).map(|pos| (direction, pos)))
            .collect()
    }

    /// Boundary buffer toward a face
    pub fn boundary_buffer(&self, direction: Direction) -> Option<&BoundaryBuffer> {
        self.boundary_buffers.get(&direction)
    }

    /// Mutable boundary buffer toward a face
    pub fn boundary_buffer_mut(&mut self, direction: Direction) -> Option<&mut BoundaryBuffer> {
        self.boundary_buffers.get_mut(&direction)
    }

    /// Install a boundary buffer, replacing any previous one for its direction
    pub fn set_boundary_buffer(&mut self, buffer: BoundaryBuffer) {
        self.boundary_buffers.insert(buffer.direction(), buffer);
    }

    /// Drop the boundary buffer toward a face
    pub fn remove_boundary_buffer(&mut self, direction: Direction) -> Option<BoundaryBuffer> {
        self.boundary_buffers.remove(&direction)
    }

    /// Whether a compact representation replaced the dense cells
    pub const fn is_optimized(&self) -> bool {
        self.compact.is_some()
    }

    /// Replace dense cells with the compact representation
    ///
    /// Fully collapsed chunks keep a dense state array; partially collapsed
    /// chunks keep only their collapsed cells. Uncollapsed possibility sets are
    /// dropped and come back as the candidate set on restore.
    pub fn optimize_memory(&mut self) -> bool {
        if self.compact.is_some() {
            return false;
        }
        let compact = if self.cells.iter().all(Cell::is_collapsed) {
            CompactCells::Collapsed(
                self.cells
                    .map(|cell| cell.collapsed_state().unwrap_or_default()),
            )
        } else {
            CompactCells::Sparse(self.collapsed_cells())
        };
        self.compact = Some(compact);
        self.cells = Array3::from_shape_fn((0, 0, 0), |_| Cell::new([0; 3], 0));
        true
    }

    /// Rebuild the dense cells from the compact representation
    ///
    /// Returns whether a restoration happened.
    pub fn restore(&mut self) -> bool {
        let Some(compact) = self.compact.take() else {
            return false;
        };
        let mut cells = Self::build_cells(self.size, self.state_capacity);
        match compact {
            CompactCells::Collapsed(states) => {
                for (cell, &state) in cells.iter_mut().zip(states.iter()) {
                    cell.initialize(&StateSet::singleton(self.state_capacity, state));
                }
            }
            CompactCells::Sparse(entries) => {
                if self.is_initialized() {
                    for cell in &mut cells {
                        cell.initialize(&self.candidates);
                    }
                }
                for (position, state) in entries {
                    if let Some(cell) = cells.get_mut(position)
                        && !cell.collapse(state)
                    {
                        cell.initialize(&StateSet::singleton(self.state_capacity, state));
                    }
                }
            }
        }
        self.cells = cells;
        true
    }
}
