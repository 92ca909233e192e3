use bitvec::prelude::*;
use std::fmt;

/// Identifier of a discrete cell state
pub type StateId = usize;

/// Fixed-capacity bitset of candidate states
///
/// States are 0-based ids below the capacity. Provides O(1) membership
/// testing and word-wise intersection and union for propagation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateSet {
    bits: BitVec,
}

impl StateSet {
    /// Create a set with no states present
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: bitvec![0; capacity],
        }
    }

    /// Create a set containing every state below the capacity
    pub fn all(capacity: usize) -> Self {
        Self {
            bits: bitvec![1; capacity],
        }
    }

    /// Create a set holding exactly one state
    pub fn singleton(capacity: usize, state: StateId) -> Self {
        let mut set = Self::new(capacity);
        set.insert(state);
        set
    }

    /// Create a set from a list of states, ignoring ids outside the capacity
    pub fn from_states(capacity: usize, states: &[StateId]) -> Self {
        let mut set = Self::new(capacity);
        for &state in states {
            set.insert(state);
        }
        set
    }

    /// Number of state ids this set can hold
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Insert a state, returning whether it was newly added
    pub fn insert(&mut self, state: StateId) -> bool {
        if state >= self.bits.len() || self.contains(state) {
            return false;
        }
        self.bits.set(state, true);
        true
    }

    /// Remove a state, returning whether it was present
    pub fn remove(&mut self, state: StateId) -> bool {
        if !self.contains(state) {
            return false;
        }
        self.bits.set(state, false);
        true
    }

    /// Test state membership
    pub fn contains(&self, state: StateId) -> bool {
        self.bits.get(state).as_deref() == Some(&true)
    }

    /// Remove every state
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Intersect this set with another in-place
    pub fn intersect_with(&mut self, other: &Self) {
        self.bits &= &other.bits;
    }

    /// Add every state of another set in-place
    pub fn union_with(&mut self, other: &Self) {
        self.bits |= &other.bits;
    }

    /// Create a new set containing the intersection
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Whether the two sets share at least one state
    pub fn intersects(&self, other: &Self) -> bool {
        self.bits
            .iter_ones()
            .any(|state| other.bits.get(state).as_deref() == Some(&true))
    }

    /// Test if no states are present
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Count states in the set
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// The lowest state present
    pub fn first(&self) -> Option<StateId> {
        self.bits.first_one()
    }

    /// The only state, if the set is a singleton
    pub fn sole(&self) -> Option<StateId> {
        if self.count() == 1 { self.first() } else { None }
    }

    /// Iterate states in ascending order
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.bits.iter_ones()
    }

    /// Extract all states as a vector in ascending order
    pub fn to_vec(&self) -> Vec<StateId> {
        self.bits.iter_ones().collect()
    }

    /// Overwrite this set with another of the same capacity without reallocating
    pub fn copy_from(&mut self, other: &Self) {
        if self.bits.len() == other.bits.len() {
            self.bits.copy_from_bitslice(&other.bits);
        } else {
            self.bits.clone_from(&other.bits);
        }
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateSet({} states: {:?})", self.count(), self.to_vec())
    }
}
