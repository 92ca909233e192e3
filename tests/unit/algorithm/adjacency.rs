//! Tests for the adjacency rule table

#[cfg(test)]
mod tests {
    use chunkwfc::algorithm::adjacency::AdjacencyRules;
    use chunkwfc::algorithm::bitset::StateSet;
    use chunkwfc::spatial::direction::Direction;

    // Tests a new table allows nothing
    #[test]
    fn test_new_is_empty() {
        let rules = AdjacencyRules::new(3);
        assert_eq!(rules.state_count(), 3);
        for direction in Direction::ALL {
            assert!(!rules.are_states_compatible(0, 0, direction));
            assert_eq!(rules.compatible_states(1, direction).map(StateSet::count), Some(0));
        }
    }

    // Tests allowing a pair also allows its mirror
    #[test]
    fn test_allow_sets_mirror() {
        let mut rules = AdjacencyRules::new(3);
        assert!(rules.allow(0, 2, Direction::East));

        assert!(rules.are_states_compatible(0, 2, Direction::East));
        assert!(rules.are_states_compatible(2, 0, Direction::West));
        assert!(!rules.are_states_compatible(2, 0, Direction::East));
        assert!(!rules.are_states_compatible(0, 2, Direction::Up));
    }

    // Tests disallowing clears both entries and rejects out-of-range states
    #[test]
    fn test_set_compatible_false() {
        let mut rules = AdjacencyRules::permissive(2);
        assert!(rules.set_compatible(0, 1, Direction::North, false));
        assert!(!rules.are_states_compatible(0, 1, Direction::North));
        assert!(!rules.are_states_compatible(1, 0, Direction::South));
        assert!(rules.are_states_compatible(0, 1, Direction::South));

        assert!(!rules.allow(0, 2, Direction::North));
        assert!(!rules.are_states_compatible(0, 5, Direction::North));
        assert!(rules.compatible_states(2, Direction::North).is_none());
    }

    // Tests the permissive table allows every pair everywhere
    #[test]
    fn test_permissive() {
        let rules = AdjacencyRules::permissive(3);
        for direction in Direction::ALL {
            for a in 0..3 {
                assert_eq!(rules.compatible_states(a, direction), Some(&StateSet::all(3)));
            }
        }
    }

    // Tests the banded table only allows nearby states
    #[test]
    fn test_banded() {
        let rules = AdjacencyRules::banded(5, 1);
        assert!(rules.are_states_compatible(2, 3, Direction::Up));
        assert!(rules.are_states_compatible(2, 2, Direction::Up));
        assert!(!rules.are_states_compatible(2, 4, Direction::Up));
        assert_eq!(
            rules.compatible_states(0, Direction::East).map(StateSet::to_vec),
            Some(vec![0, 1])
        );
    }

    // Tests compatible_with unions the rows of every source state
    #[test]
    fn test_compatible_with() {
        let rules = AdjacencyRules::banded(6, 1);
        let sources = StateSet::from_states(6, &[0, 4]);
        assert_eq!(
            rules.compatible_with(&sources, Direction::Down).to_vec(),
            vec![0, 1, 3, 4, 5]
        );
        assert!(rules.compatible_with(&StateSet::new(6), Direction::Down).is_empty());
    }
}
