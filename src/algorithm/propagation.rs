use crate::algorithm::adjacency::AdjacencyRules;
use crate::algorithm::bitset::StateSet;
use crate::io::configuration::BOUNDARY_PRIORITY_BOOST;
use crate::spatial::chunk::{Chunk, ChunkPosition};
use crate::spatial::direction::Direction;
use log::warn;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// State change at one cell, consumed once by the propagation worklist
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationEvent {
    /// Chunk owning the changed cell
    pub chunk: ChunkPosition,
    /// Chunk-local position of the changed cell
    pub cell: [usize; 3],
    /// Possible states before the change
    pub old_states: StateSet,
    /// Possible states after the change
    pub new_states: StateSet,
    /// Whether the changed cell lies on a chunk face
    pub is_boundary: bool,
    /// Worklist priority, lower dequeued first
    pub priority: i64,
}

impl PropagationEvent {
    /// Create an event, deriving its priority from the new state count
    ///
    /// Boundary events are boosted ahead of interior ones.
    pub fn new(
        chunk: ChunkPosition,
        cell: [usize; 3],
        old_states: StateSet,
        new_states: StateSet,
        is_boundary: bool,
    ) -> Self {
        let priority = Self::priority_for(&new_states, is_boundary);
        Self {
            chunk,
            cell,
            old_states,
            new_states,
            is_boundary,
            priority,
        }
    }

    /// Priority of an event with the given new states
    pub fn priority_for(new_states: &StateSet, is_boundary: bool) -> i64 {
        let base = new_states.count() as i64;
        if is_boundary {
            base - BOUNDARY_PRIORITY_BOOST
        } else {
            base
        }
    }
}

#[derive(Debug)]
struct QueuedEvent {
    sequence: u64,
    event: PropagationEvent,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    // Max-heap order: lowest priority first, then earliest enqueued
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .priority
            .cmp(&self.event.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority worklist of propagation events
///
/// Events with equal priority leave in insertion order.
#[derive(Debug, Default)]
pub struct PropagationQueue {
    heap: BinaryHeap<QueuedEvent>,
    next_sequence: u64,
}

impl PropagationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event
    pub fn push(&mut self, event: PropagationEvent) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedEvent { sequence, event });
    }

    /// Dequeue the lowest-priority event
    pub fn pop(&mut self) -> Option<PropagationEvent> {
        self.heap.pop().map(|queued| queued.event)
    }

    /// Peek at the priority of the next event
    pub fn peek_priority(&self) -> Option<i64> {
        self.heap.peek().map(|queued| queued.event.priority)
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

/// Result of filtering the in-chunk neighbors of one changed cell
#[derive(Debug, Default)]
pub struct PropagationStep {
    /// Events for neighbors whose possible states narrowed
    pub events: Vec<PropagationEvent>,
    /// Neighbors left with no compatible state
    pub contradictions: usize,
}

/// Narrow the face-adjacent cells of a changed cell within its chunk
///
/// Each neighbor keeps only states compatible with at least one of the
/// event's new states. Neighbors across the chunk face are left to the
/// boundary buffer protocol. An empty intersection is a contradiction: the
/// neighbor keeps its states and the contradiction is counted.
pub fn propagate_event(
    chunk: &mut Chunk,
    rules: &AdjacencyRules,
    event: &PropagationEvent,
) -> PropagationStep {
    let mut step = PropagationStep::default();
    let size = chunk.size();
    let chunk_position = chunk.position();

    for direction in Direction::ALL {
        let Some(neighbor_position) = direction.step(event.cell, size) else {
            continue;
        };
        let allowed = rules.compatible_with(&event.new_states, direction);
        let Some(neighbor) = chunk.cell_mut(neighbor_position) else {
            continue;
        };

        let narrowed = neighbor.possible_states().intersection(&allowed);
        if narrowed.is_empty() {
            if !neighbor.possible_states().is_empty() {
                warn!(
                    "Contradiction in chunk {chunk_position} at {neighbor_position:?}: no state of {} allowed {direction} of {:?}",
                    neighbor.possible_states(),
                    event.cell
                );
                step.contradictions += 1;
            }
            continue;
        }

        let old_states = neighbor.possible_states().clone();
        if neighbor.set_possible_states(&narrowed) {
            step.events.push(PropagationEvent::new(
                chunk_position,
                neighbor_position,
                old_states,
                narrowed,
                neighbor.is_boundary(),
            ));
        }
    }

    step
}
