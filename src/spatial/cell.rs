//! Single constrained variable of the collapse lattice
//!
//! A cell holds the set of states it may still take. It is collapsed exactly
//! when that set holds a single state, and a collapsed cell rejects every
//! further mutation. Cells never emit propagation events themselves; callers
//! enqueue an event whenever a narrowing call reports success.

use crate::algorithm::bitset::{StateId, StateSet};
use crate::spatial::direction::Direction;

/// One lattice cell with its remaining candidate states
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    position: [usize; 3],
    possible_states: StateSet,
    collapsed_state: Option<StateId>,
    boundary_direction: Option<Direction>,
}

impl Cell {
    /// Create an uninitialized cell with an empty state set
    pub fn new(position: [usize; 3], state_capacity: usize) -> Self {
        Self {
            position,
            possible_states: StateSet::new(state_capacity),
            collapsed_state: None,
            boundary_direction: None,
        }
    }

    /// Chunk-local lattice position
    pub const fn position(&self) -> [usize; 3] {
        self.position
    }

    /// States this cell may still take
    pub const fn possible_states(&self) -> &StateSet {
        &self.possible_states
    }

    /// The final state, present iff exactly one state remains
    pub const fn collapsed_state(&self) -> Option<StateId> {
        self.collapsed_state
    }

    /// Whether the cell has reached its terminal state
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed_state.is_some()
    }

    /// Number of remaining states
    pub fn entropy(&self) -> usize {
        self.possible_states.count()
    }

    /// Whether the cell lies on a chunk face
    pub const fn is_boundary(&self) -> bool {
        self.boundary_direction.is_some()
    }

    /// First chunk face this cell lies on
    pub const fn boundary_direction(&self) -> Option<Direction> {
        self.boundary_direction
    }

    /// Flag the cell as lying on the given chunk face
    ///
    /// Corner and edge cells keep the first face they were marked with.
    pub const fn mark_boundary(&mut self, direction: Direction) {
        if self.boundary_direction.is_none() {
            self.boundary_direction = Some(direction);
        }
    }

    /// Populate the candidate states of a cell that has not collapsed
    ///
    /// Returns false for collapsed cells or an empty candidate set.
    pub fn initialize(&mut self, candidates: &StateSet) -> bool {
        if self.is_collapsed() || candidates.is_empty() {
            return false;
        }
        self.possible_states.copy_from(candidates);
        self.sync_collapsed_state();
        true
    }

    /// Fix the cell to one of its possible states
    ///
    /// Fails when the cell is already collapsed or the state is not possible.
    pub fn collapse(&mut self, state: StateId) -> bool {
        if self.is_collapsed() || !self.possible_states.contains(state) {
            return false;
        }
        self.possible_states.clear();
        self.possible_states.insert(state);
        self.collapsed_state = Some(state);
        true
    }

    /// Discard one possible state
    ///
    /// Fails when collapsed or the state is absent. Leaving a single state
    /// collapses the cell to it.
    pub fn remove_state(&mut self, state: StateId) -> bool {
        if self.is_collapsed() || !self.possible_states.contains(state) {
            return false;
        }
        self.possible_states.remove(state);
        self.sync_collapsed_state();
        true
    }

    /// Replace the possible states, returning whether anything changed
    ///
    /// Fails when collapsed or the new set is empty. A singleton collapses the cell.
    pub fn set_possible_states(&mut self, states: &StateSet) -> bool {
        if self.is_collapsed() || states.is_empty() {
            return false;
        }
        if self.possible_states.count() == states.count() && self.possible_states == *states {
            return false;
        }
        self.possible_states.copy_from(states);
        self.sync_collapsed_state();
        true
    }

    fn sync_collapsed_state(&mut self) {
        self.collapsed_state = self.possible_states.sole();
    }
}
