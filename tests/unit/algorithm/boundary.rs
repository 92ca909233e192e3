//! Tests for boundary buffers, cross-chunk updates and seam auditing

#[cfg(test)]
mod tests {
    use chunkwfc::algorithm::adjacency::AdjacencyRules;
    use chunkwfc::algorithm::bitset::StateSet;
    use chunkwfc::algorithm::boundary::{BoundaryBuffer, BoundaryBufferManager};
    use chunkwfc::spatial::chunk::{Chunk, ChunkPosition};
    use chunkwfc::spatial::chunk_map::ChunkMap;
    use chunkwfc::spatial::direction::Direction;

    const STATES: usize = 4;
    const WEST: ChunkPosition = ChunkPosition::new(0, 0, 0);
    const EAST: ChunkPosition = ChunkPosition::new(1, 0, 0);

    fn two_chunk_map() -> ChunkMap {
        let mut map = ChunkMap::new();
        for position in [WEST, EAST] {
            let mut chunk = Chunk::new(position, 2, STATES);
            chunk.initialize_cells(&StateSet::all(STATES));
            map.insert(chunk);
        }
        assert_eq!(BoundaryBufferManager::initialize_all_buffers(&mut map), 12);
        map
    }

    fn collapse(map: &mut ChunkMap, position: ChunkPosition, cell: [usize; 3], state: usize) {
        assert!(
            map.get_mut(position)
                .and_then(|chunk| chunk.cell_mut(cell))
                .is_some_and(|c| c.collapse(state))
        );
    }

    fn states(map: &ChunkMap, position: ChunkPosition, cell: [usize; 3]) -> Vec<usize> {
        map.get(position)
            .and_then(|chunk| chunk.states_at(cell))
            .map(|s| s.to_vec())
            .unwrap_or_default()
    }

    // Tests a new buffer lists its face cells with empty mirrors
    #[test]
    fn test_buffer_new() {
        let buffer = BoundaryBuffer::new(WEST, Direction::East, Some(EAST), 3, STATES);
        assert_eq!(buffer.len(), 9);
        assert_eq!(buffer.boundary_cells(), Direction::East.face_cells(3).as_slice());
        assert!(buffer.buffer_states().iter().all(StateSet::is_empty));
        assert_eq!(buffer.owner(), WEST);
        assert_eq!(buffer.adjacent(), Some(EAST));
        assert_eq!(buffer.direction(), Direction::East);
    }

    // Tests mirror writes report changes and detaching clears them
    #[test]
    fn test_buffer_set_and_detach() {
        let mut buffer = BoundaryBuffer::new(WEST, Direction::Up, None, 2, STATES);
        let states = StateSet::from_states(STATES, &[1, 2]);
        assert!(buffer.set_buffer_state(3, &states));
        assert!(!buffer.set_buffer_state(3, &states));
        assert!(!buffer.set_buffer_state(4, &states));
        assert_eq!(buffer.buffer_state(3), Some(&states));

        buffer.set_adjacent(Some(EAST));
        buffer.detach();
        assert_eq!(buffer.adjacent(), None);
        assert!(buffer.buffer_state(3).is_some_and(StateSet::is_empty));
    }

    // Tests buffers link to loaded neighbors and stay open at world edges
    #[test]
    fn test_initialize_buffers_links_neighbors() {
        let map = two_chunk_map();
        let west = map.get(WEST).expect("west chunk");
        assert_eq!(
            west.boundary_buffer(Direction::East).and_then(BoundaryBuffer::adjacent),
            Some(EAST)
        );
        assert_eq!(
            west.boundary_buffer(Direction::West).and_then(BoundaryBuffer::adjacent),
            None
        );
        let mut empty = ChunkMap::new();
        assert_eq!(BoundaryBufferManager::initialize_buffers(&mut empty, WEST), 0);
    }

    // Tests a collapse is mirrored and filters the touching neighbor cell
    #[test]
    fn test_update_after_collapse_filters_neighbor() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 1);
        let mut manager = BoundaryBufferManager::new();
        collapse(&mut map, WEST, [1, 1, 0], 0);

        let events = manager.update_buffers_after_collapse(&mut map, &rules, WEST, [1, 1, 0]);
        assert!(events.is_empty());
        assert_eq!(states(&map, EAST, [0, 1, 0]), vec![0, 1]);
        assert_eq!(states(&map, EAST, [0, 0, 0]), vec![0, 1, 2, 3]);
        assert_eq!(manager.stats.updates, 1);
        assert_eq!(manager.stats.narrowed_cells, 1);

        let index = Direction::East.face_index([1, 1, 0], 2).expect("face cell");
        let mirror = map
            .get(EAST)
            .and_then(|c| c.boundary_buffer(Direction::West))
            .and_then(|b| b.buffer_state(index))
            .map(StateSet::to_vec);
        assert_eq!(mirror, Some(vec![0]));
    }

    // Tests filtering a neighbor to one state raises a boundary event for it
    #[test]
    fn test_update_after_collapse_emits_singleton_event() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 0);
        let mut manager = BoundaryBufferManager::new();
        collapse(&mut map, WEST, [1, 0, 1], 2);

        let events = manager.update_buffers_after_collapse(&mut map, &rules, WEST, [1, 0, 1]);
        assert_eq!(events.len(), 1);
        let event = events.first().expect("one event");
        assert_eq!(event.chunk, EAST);
        assert_eq!(event.cell, [0, 0, 1]);
        assert!(event.is_boundary);
        assert_eq!(event.new_states.to_vec(), vec![2]);
    }

    // Tests interior cells and unlinked faces push nothing
    #[test]
    fn test_update_ignores_unlinked_faces() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 0);
        let mut manager = BoundaryBufferManager::new();
        collapse(&mut map, WEST, [0, 0, 0], 1);

        let events = manager.update_buffers_after_collapse(&mut map, &rules, WEST, [0, 0, 0]);
        assert!(events.is_empty());
        assert_eq!(manager.stats.updates, 0);
    }

    // Tests synchronizing pulls the neighbor face and is idempotent
    #[test]
    fn test_synchronize_buffer_idempotent() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 1);
        let mut manager = BoundaryBufferManager::new();
        collapse(&mut map, WEST, [1, 1, 1], 3);

        let first = manager.synchronize_buffer(&mut map, &rules, EAST, Direction::West);
        assert_eq!(first.mirrored, 4);
        assert_eq!(first.narrowed, 1);
        assert_eq!(first.conflicts, 0);
        assert_eq!(first.events.len(), 1);
        assert_eq!(states(&map, EAST, [0, 1, 1]), vec![2, 3]);

        let second = manager.synchronize_buffer(&mut map, &rules, EAST, Direction::West);
        assert_eq!(second.mirrored, 0);
        assert_eq!(second.narrowed, 0);
        assert!(second.events.is_empty());
    }

    // Tests faces without a neighbor synchronize to nothing
    #[test]
    fn test_synchronize_world_edge() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::permissive(STATES);
        let mut manager = BoundaryBufferManager::new();
        let outcome = manager.synchronize_buffer(&mut map, &rules, WEST, Direction::Up);
        assert_eq!(outcome.mirrored, 0);
        assert!(outcome.events.is_empty());
    }

    // Tests a full pass reaches every linked face
    #[test]
    fn test_synchronize_all_buffers() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 0);
        let mut manager = BoundaryBufferManager::new();
        collapse(&mut map, WEST, [1, 0, 0], 1);
        collapse(&mut map, EAST, [0, 1, 1], 2);

        let outcome = manager.synchronize_all_buffers(&mut map, &rules);
        assert_eq!(outcome.narrowed, 2);
        assert_eq!(states(&map, EAST, [0, 0, 0]), vec![1]);
        assert_eq!(states(&map, WEST, [1, 1, 1]), vec![2]);

        let again = manager.synchronize_all_buffers(&mut map, &rules);
        assert_eq!(again.narrowed, 0);
    }

    // Tests incompatible collapsed neighbors are reported from both sides
    #[test]
    fn test_conflicts_found_and_validated() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 0);
        collapse(&mut map, WEST, [1, 0, 0], 0);
        collapse(&mut map, EAST, [0, 0, 0], 2);

        let conflicts = BoundaryBufferManager::find_conflicts(&map, &rules, WEST, Direction::East);
        assert_eq!(conflicts.len(), 1);
        let conflict = conflicts.first().expect("one conflict");
        assert_eq!(conflict.cell, [1, 0, 0]);
        assert_eq!(conflict.state, 0);
        assert_eq!(conflict.neighbor, EAST);
        assert_eq!(conflict.neighbor_cell, [0, 0, 0]);
        assert_eq!(conflict.neighbor_states.to_vec(), vec![2]);

        assert!(!BoundaryBufferManager::validate_boundary(&map, &rules, WEST, Direction::East));
        assert!(BoundaryBufferManager::validate_boundary(&map, &rules, WEST, Direction::West));
        assert_eq!(BoundaryBufferManager::validate_all_boundaries(&map, &rules).len(), 2);
    }

    // Tests undecided neighbors only conflict when no state fits
    #[test]
    fn test_conflicts_against_open_neighbor() {
        let mut map = two_chunk_map();
        let rules = AdjacencyRules::banded(STATES, 0);
        collapse(&mut map, WEST, [1, 1, 0], 3);
        assert!(BoundaryBufferManager::find_conflicts(&map, &rules, WEST, Direction::East).is_empty());

        if let Some(cell) = map.get_mut(EAST).and_then(|c| c.cell_mut([0, 1, 0])) {
            assert!(cell.set_possible_states(&StateSet::from_states(STATES, &[0, 1])));
        }
        assert_eq!(
            BoundaryBufferManager::find_conflicts(&map, &rules, WEST, Direction::East).len(),
            1
        );
    }
}
