use crate::algorithm::bitset::{StateId, StateSet};
use crate::spatial::direction::Direction;
use ndarray::Array3;

/// Static relation of which states may sit next to each other
///
/// Entry `[a, b, d]` answers whether state `b` may occupy the cell one step in
/// direction `d` from a cell holding state `a`. Setting an entry also sets the
/// mirrored entry `[b, a, opposite(d)]`, so the table stays symmetric.
#[derive(Clone, Debug)]
pub struct AdjacencyRules {
    state_count: usize,
    table: Array3<bool>,
    rows: Vec<StateSet>,
}

impl AdjacencyRules {
    /// Create a table with no compatible pairs
    pub fn new(state_count: usize) -> Self {
        Self {
            state_count,
            table: Array3::from_elem((state_count, state_count, Direction::COUNT), false),
            rows: vec![StateSet::new(state_count); state_count * Direction::COUNT],
        }
    }

    /// Create a table where every pair is compatible in every direction
    pub fn permissive(state_count: usize) -> Self {
        let mut rules = Self::new(state_count);
        for a in 0..state_count {
            for b in 0..state_count {
                for direction in Direction::ALL {
                    rules.allow(a, b, direction);
                }
            }
        }
        rules
    }

    /// Create a layered table where states within `tolerance` ids of each other may touch
    ///
    /// With ordered states (deep water up to mountain peak) this yields smooth
    /// transitions between neighboring terrain bands.
    pub fn banded(state_count: usize, tolerance: usize) -> Self {
        let mut rules = Self::new(state_count);
        for a in 0..state_count {
            for b in 0..state_count {
                if a.abs_diff(b) <= tolerance {
                    for direction in Direction::ALL {
                        rules.allow(a, b, direction);
                    }
                }
            }
        }
        rules
    }

    /// Number of states the table covers
    pub const fn state_count(&self) -> usize {
        self.state_count
    }

    /// Set containing every state id
    pub fn all_states(&self) -> StateSet {
        StateSet::all(self.state_count)
    }

    /// Allow `b` one step in `direction` from `a`, and the mirrored pair
    ///
    /// Returns false if either state is out of range.
    pub fn allow(&mut self, a: StateId, b: StateId, direction: Direction) -> bool {
        self.set_compatible(a, b, direction, true)
    }

    /// Set whether `b` may sit one step in `direction` from `a`, and the mirrored pair
    ///
    /// Returns false if either state is out of range.
    pub fn set_compatible(
        &mut self,
        a: StateId,
        b: StateId,
        direction: Direction,
        compatible: bool,
    ) -> bool {
        if a >= self.state_count || b >= self.state_count {
            return false;
        }
        self.write_entry(a, b, direction, compatible);
        self.write_entry(b, a, direction.opposite(), compatible);
        true
    }

    fn write_entry(&mut self, a: StateId, b: StateId, direction: Direction, compatible: bool) {
        if let Some(entry) = self.table.get_mut([a, b, direction.index()]) {
            *entry = compatible;
        }
        let row = direction.index() * self.state_count + a;
        if let Some(set) = self.rows.get_mut(row) {
            if compatible {
                set.insert(b);
            } else {
                set.remove(b);
            }
        }
    }

    /// Whether `b` may sit one step in `direction` from `a`
    pub fn are_states_compatible(&self, a: StateId, b: StateId, direction: Direction) -> bool {
        self.table
            .get([a, b, direction.index()])
            .copied()
            .unwrap_or(false)
    }

    /// States allowed one step in `direction` from a cell holding `a`
    pub fn compatible_states(&self, a: StateId, direction: Direction) -> Option<&StateSet> {
        if a >= self.state_count {
            return None;
        }
        self.rows.get(direction.index() * self.state_count + a)
    }

    /// States allowed one step in `direction` from a cell holding any of `states`
    pub fn compatible_with(&self, states: &StateSet, direction: Direction) -> StateSet {
        let mut allowed = StateSet::new(self.state_count);
        for a in states.iter() {
            if let Some(row) = self.compatible_states(a, direction) {
                allowed.union_with(row);
            }
        }
        allowed
    }
}
