//! Tests for the per-chunk collapse driver and seeded selection

#[cfg(test)]
mod tests {
    use chunkwfc::algorithm::adjacency::AdjacencyRules;
    use chunkwfc::algorithm::bitset::StateSet;
    use chunkwfc::algorithm::executor::{CollapseStats, RandomSelector, WfcCore};
    use chunkwfc::algorithm::propagation::PropagationEvent;
    use chunkwfc::constraints::hierarchy::HierarchicalConstraintSystem;
    use chunkwfc::io::error::GenerationError;
    use chunkwfc::spatial::chunk::{Chunk, ChunkPosition, LodSettings};
    use chunkwfc::spatial::chunk_map::ChunkMap;
    use chunkwfc::spatial::direction::Direction;

    fn map_with(positions: &[ChunkPosition], size: usize, states: usize) -> ChunkMap {
        let mut map = ChunkMap::new();
        for &position in positions {
            map.insert(Chunk::new(position, size, states));
        }
        map
    }

    fn ready_core(rules: AdjacencyRules, seed: u64, map: &mut ChunkMap) -> WfcCore {
        let core = WfcCore::new(rules, seed);
        for position in map.positions() {
            core.initialize_chunk(map, position).expect("chunk is loaded");
        }
        core
    }

    // Tests zero total weight falls back to the first index
    #[test]
    fn test_weighted_choice_degenerate() {
        let mut selector = RandomSelector::new(1);
        assert_eq!(selector.weighted_choice(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(selector.weighted_choice(&[]), 0);
    }

    // Tests sampling only lands on positive weights and repeats per seed
    #[test]
    fn test_weighted_choice_seeded() {
        let mut a = RandomSelector::new(99);
        let mut b = RandomSelector::new(99);
        let weights = [0.0, 0.3, 0.0, 0.7];
        for _ in 0..200 {
            let choice = a.weighted_choice(&weights);
            assert!(choice == 1 || choice == 3);
            assert_eq!(choice, b.weighted_choice(&weights));
        }
    }

    // Tests merging adds every counter
    #[test]
    fn test_stats_merge() {
        let mut total = CollapseStats {
            iterations: 1,
            collapses: 2,
            forced_collapses: 3,
            propagation_steps: 4,
            contradictions: 5,
            boundary_events: 6,
        };
        let copy = total;
        total.merge(&copy);
        assert_eq!(total.iterations, 2);
        assert_eq!(total.boundary_events, 12);
    }

    // Tests initialization fills cells and installs every face buffer
    #[test]
    fn test_initialize_chunk() {
        let mut map = map_with(&[ChunkPosition::default()], 3, 4);
        let core = WfcCore::new(AdjacencyRules::permissive(4), 0);
        assert_eq!(core.initialize_chunk(&mut map, ChunkPosition::default()).ok(), Some(27));

        let chunk = map.get(ChunkPosition::default()).expect("chunk");
        assert!(chunk.is_initialized());
        assert!(Direction::ALL.iter().all(|&d| chunk.boundary_buffer(d).is_some()));
        assert_eq!(chunk.states_at([1, 1, 1]), Some(StateSet::all(4)));

        let missing = ChunkPosition::new(5, 5, 5);
        assert!(matches!(
            core.initialize_chunk(&mut map, missing),
            Err(GenerationError::ChunkNotFound { position }) if position == missing
        ));
    }

    // Tests each collapse looks up the cell weights once
    #[test]
    fn test_collapse_reads_weights_once_per_cell() {
        let position = ChunkPosition::default();
        let mut map = map_with(&[position], 2, 3);
        let mut core = ready_core(AdjacencyRules::permissive(3), 4, &mut map);
        let mut constraints = HierarchicalConstraintSystem::new(3);

        let stats = core
            .collapse_chunk(&mut map, &mut constraints, position)
            .expect("chunk is loaded");
        assert_eq!(stats.collapses, 8);
        assert_eq!(stats.forced_collapses, 0);
        let lookups = constraints.cache_stats();
        assert_eq!(lookups.hits + lookups.misses, 8);
        assert_eq!(lookups.misses, 1);
    }

    // Tests a chunk collapses completely with every neighbor pair allowed
    #[test]
    fn test_collapse_chunk_respects_rules() {
        let position = ChunkPosition::default();
        let mut map = map_with(&[position], 3, 4);
        let mut core = ready_core(AdjacencyRules::banded(4, 1), 7, &mut map);
        let mut constraints = HierarchicalConstraintSystem::new(4);

        let stats = core
            .collapse_chunk(&mut map, &mut constraints, position)
            .expect("chunk is loaded");
        assert_eq!(stats.contradictions, 0);
        assert!(stats.collapses >= 1);
        assert_eq!(stats, core.stats);

        let chunk = map.get(position).expect("chunk");
        assert!(chunk.all_cells_collapsed());
        assert!(chunk.is_fully_collapsed());
        for (cell, state) in chunk.collapsed_cells() {
            for direction in Direction::ALL {
                let Some(next) = direction.step(cell, 3) else {
                    continue;
                };
                let other = chunk.collapsed_state_at(next).expect("collapsed neighbor");
                assert!(state.abs_diff(other) <= 1, "{cell:?}={state} next to {next:?}={other}");
            }
        }
    }

    // Tests equal seeds collapse identically
    #[test]
    fn test_collapse_deterministic() {
        let position = ChunkPosition::default();
        let run = |seed: u64| {
            let mut map = map_with(&[position], 3, 5);
            let mut core = ready_core(AdjacencyRules::banded(5, 1), seed, &mut map);
            let mut constraints = HierarchicalConstraintSystem::new(5);
            core.collapse_chunk(&mut map, &mut constraints, position)
                .expect("chunk is loaded");
            map.get(position).map(Chunk::collapsed_cells).unwrap_or_default()
        };
        assert_eq!(run(11), run(11));
    }

    // Tests an exhausted iteration budget still marks the chunk finished
    #[test]
    fn test_collapse_budget() {
        let position = ChunkPosition::default();
        let mut map = map_with(&[position], 2, 3);
        if let Some(chunk) = map.get_mut(position) {
            chunk.set_lod(LodSettings {
                level: 0,
                max_iterations: 2,
                constraint_influence: 1.0,
            });
        }
        let mut core = ready_core(AdjacencyRules::permissive(3), 3, &mut map);
        let mut constraints = HierarchicalConstraintSystem::new(3);

        let stats = core
            .collapse_chunk(&mut map, &mut constraints, position)
            .expect("chunk is loaded");
        assert_eq!(stats.iterations, 2);
        let chunk = map.get(position).expect("chunk");
        assert_eq!(chunk.collapsed_count(), 2);
        assert!(!chunk.all_cells_collapsed());
        assert!(chunk.is_fully_collapsed());
    }

    // Tests collapsing a missing chunk fails
    #[test]
    fn test_collapse_missing_chunk() {
        let mut map = ChunkMap::new();
        let mut core = WfcCore::new(AdjacencyRules::permissive(2), 0);
        let mut constraints = HierarchicalConstraintSystem::new(2);
        assert!(
            core.collapse_chunk(&mut map, &mut constraints, ChunkPosition::default())
                .is_err()
        );
    }

    // Tests propagation stops at its step budget and keeps the rest queued
    #[test]
    fn test_propagate_budget() {
        let position = ChunkPosition::default();
        let mut map = map_with(&[position], 2, 3);
        let mut core = ready_core(AdjacencyRules::permissive(3), 0, &mut map);
        for cell in [[0, 0, 0], [1, 0, 0], [0, 1, 0]] {
            core.add_propagation_event(PropagationEvent::new(
                position,
                cell,
                StateSet::all(3),
                StateSet::all(3),
                false,
            ));
        }

        let stats = core.propagate(&mut map, 1);
        assert_eq!(stats.propagation_steps, 1);
        assert_eq!(core.pending_events(), 2);
        core.clear_events();
        assert_eq!(core.pending_events(), 0);
    }

    // Tests boundary collapses in one chunk reach its neighbor
    #[test]
    fn test_collapse_all_pushes_across_faces() {
        let west = ChunkPosition::new(0, 0, 0);
        let east = ChunkPosition::new(1, 0, 0);
        let mut map = map_with(&[west, east], 2, 3);
        let mut core = ready_core(AdjacencyRules::banded(3, 0), 5, &mut map);
        let mut constraints = HierarchicalConstraintSystem::new(3);

        let stats = core
            .collapse_all(&mut map, &mut constraints)
            .expect("chunks are loaded");
        assert!(stats.boundary_events > 0);
        assert!(core.boundary().stats.updates > 0);

        let state = map
            .get(west)
            .and_then(|c| c.collapsed_state_at([0, 0, 0]))
            .expect("west collapsed");
        for chunk in map.iter() {
            assert!(chunk.all_cells_collapsed());
            assert!(chunk.collapsed_cells().iter().all(|&(_, s)| s == state));
        }
        assert!(core.validate_boundaries(&map).is_empty());
    }

    // Tests a synchronization pass queues its narrowing events
    #[test]
    fn test_synchronize_boundaries_queues_events() {
        let west = ChunkPosition::new(0, 0, 0);
        let east = ChunkPosition::new(1, 0, 0);
        let mut map = map_with(&[west, east], 2, 3);
        let mut core = ready_core(AdjacencyRules::banded(3, 0), 5, &mut map);
        if let Some(cell) = map.get_mut(west).and_then(|c| c.cell_mut([1, 0, 0])) {
            assert!(cell.collapse(2));
        }

        let outcome = core.synchronize_boundaries(&mut map);
        assert_eq!(outcome.narrowed, 1);
        assert!(outcome.events.is_empty());
        assert_eq!(core.pending_events(), 1);

        core.propagate(&mut map, 100);
        let east_chunk = map.get(east).expect("east chunk");
        assert!(east_chunk.collapsed_cells().iter().all(|&(_, s)| s == 2));
        assert_eq!(east_chunk.collapsed_count(), 8);
    }
}
