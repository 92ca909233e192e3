//! Tests for chunk-scoped transition and pattern regions

#[cfg(test)]
mod tests {
    use chunkwfc::constraints::region::{
        PatternType, RegionConstraint, RegionKind, pattern_gate, transition_parameter,
    };
    use chunkwfc::spatial::chunk::ChunkPosition;

    const SIZE: usize = 4;

    fn transition(noise_amplitude: f64) -> RegionConstraint {
        RegionConstraint::new(
            "shore",
            RegionKind::Transition {
                from: 0,
                to: 1,
                direction: [1.0, 0.0, 0.0],
                noise_scale: 4.0,
                noise_amplitude,
            },
            ChunkPosition::new(0, 0, 0),
            ChunkPosition::new(1, 0, 0),
        )
    }

    // Tests chunk box membership is inclusive on every axis
    #[test]
    fn test_contains_chunk() {
        let region = transition(0.0);
        assert!(region.contains_chunk(ChunkPosition::new(0, 0, 0)));
        assert!(region.contains_chunk(ChunkPosition::new(1, 0, 0)));
        assert!(!region.contains_chunk(ChunkPosition::new(2, 0, 0)));
        assert!(!region.contains_chunk(ChunkPosition::new(0, -1, 0)));
    }

    // Tests normalized coordinates use cell centers across the whole chunk box
    #[test]
    fn test_normalized_position() {
        let region = transition(0.0);
        let first = region
            .normalized_position(ChunkPosition::new(0, 0, 0), [0, 0, 0], SIZE)
            .expect("inside region");
        assert!((first[0] - 0.0625).abs() < 1e-12);
        assert!((first[1] - 0.125).abs() < 1e-12);

        let last = region
            .normalized_position(ChunkPosition::new(1, 0, 0), [3, 3, 3], SIZE)
            .expect("inside region");
        assert!((last[0] - 0.9375).abs() < 1e-12);
        assert!((last[2] - 0.875).abs() < 1e-12);

        assert!(region.normalized_position(ChunkPosition::new(3, 0, 0), [0, 0, 0], SIZE).is_none());
        assert!(region.normalized_position(ChunkPosition::new(0, 0, 0), [0, 0, 0], 0).is_none());
    }

    // Tests the transition favors its start state early and its end state late
    #[test]
    fn test_transition_blend() {
        let region = transition(0.0).with_strength(2.0);
        let start = ChunkPosition::new(0, 0, 0);
        let end = ChunkPosition::new(1, 0, 0);

        let from_early = region.bias_at(start, [0, 1, 1], SIZE, 0);
        let to_early = region.bias_at(start, [0, 1, 1], SIZE, 1);
        assert!(from_early > to_early);
        assert!((from_early + to_early - 2.0).abs() < 1e-12);

        let from_late = region.bias_at(end, [3, 1, 1], SIZE, 0);
        let to_late = region.bias_at(end, [3, 1, 1], SIZE, 1);
        assert!(to_late > from_late);
        assert!(region.bias_at(start, [0, 1, 1], SIZE, 2).abs() < f64::EPSILON);
    }

    // Tests noisy transitions keep their blend parameter in range
    #[test]
    fn test_transition_noise_bounded() {
        let region = transition(0.4).with_seed(17);
        for x in 0..SIZE {
            for z in 0..SIZE {
                let chunk = ChunkPosition::new(1, 0, 0);
                let from = region.bias_at(chunk, [x, 0, z], SIZE, 0);
                let to = region.bias_at(chunk, [x, 0, z], SIZE, 1);
                assert!((0.0..=1.0).contains(&from) && (0.0..=1.0).contains(&to));
                assert!((from + to - 1.0).abs() < 1e-12);
            }
        }
    }

    // Tests a local sub-box confines the region's influence
    #[test]
    fn test_local_bounds() {
        let region = transition(0.0).with_local_bounds([0.5, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let start = ChunkPosition::new(0, 0, 0);
        assert!(region.bias_at(start, [0, 0, 0], SIZE, 0).abs() < f64::EPSILON);
        assert!(region.bias_at(ChunkPosition::new(1, 0, 0), [0, 0, 0], SIZE, 0) > 0.0);
    }

    // Tests the transition parameter spans the box along any direction
    #[test]
    fn test_transition_parameter() {
        assert!(transition_parameter([0.0, 0.3, 0.3], [1.0, 0.0, 0.0]).abs() < 1e-12);
        assert!((transition_parameter([1.0, 0.3, 0.3], [1.0, 0.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!((transition_parameter([0.0, 0.5, 0.5], [-1.0, 0.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!((transition_parameter([0.5, 0.5, 0.5], [1.0, 1.0, 0.0]) - 0.5).abs() < 1e-12);
        assert!((transition_parameter([0.2, 0.2, 0.2], [0.0, 0.0, 0.0]) - 0.5).abs() < 1e-12);
    }

    // Tests periodic gates alternate with their scale
    #[test]
    fn test_pattern_gates() {
        let center = [0.0; 3];
        assert!((pattern_gate(PatternType::Stripes, 2.0, [1.0, 0.0, 0.0], center, 0) - 1.0).abs() < f64::EPSILON);
        assert!(pattern_gate(PatternType::Stripes, 2.0, [3.0, 0.0, 0.0], center, 0).abs() < f64::EPSILON);
        assert!((pattern_gate(PatternType::Checkerboard, 1.0, [0.5, 0.5, 0.5], center, 0) - 1.0).abs() < f64::EPSILON);
        assert!(pattern_gate(PatternType::Checkerboard, 1.0, [1.5, 0.5, 0.5], center, 0).abs() < f64::EPSILON);
        assert!((pattern_gate(PatternType::Radial, 2.0, [1.0, 0.0, 0.0], center, 0) - 1.0).abs() < f64::EPSILON);
        assert!(pattern_gate(PatternType::Radial, 2.0, [0.0, 9.0, 3.0], center, 0).abs() < f64::EPSILON);

        for step in 0..10 {
            let point = [f64::from(step) * 1.3, 0.0, 2.0];
            let spiral = pattern_gate(PatternType::Spiral, 3.0, point, center, 0);
            assert!(spiral == 0.0 || spiral == 1.0);
            let noise = pattern_gate(PatternType::Noise, 3.0, point, center, 5);
            assert!((0.0..=1.0).contains(&noise));
        }
    }

    // Tests pattern regions only bias states they list
    #[test]
    fn test_pattern_region_bias() {
        let region = RegionConstraint::new(
            "fields",
            RegionKind::Pattern {
                pattern: PatternType::Stripes,
                scale: 1.0,
            },
            ChunkPosition::new(0, 0, 0),
            ChunkPosition::new(0, 0, 0),
        )
        .with_bias(3, 0.6);

        let chunk = ChunkPosition::new(0, 0, 0);
        assert!((region.bias_at(chunk, [0, 0, 0], SIZE, 3) - 0.6).abs() < 1e-12);
        assert!(region.bias_at(chunk, [1, 0, 0], SIZE, 3).abs() < f64::EPSILON);
        assert!(region.bias_at(chunk, [0, 0, 0], SIZE, 1).abs() < f64::EPSILON);

        let mut biases = vec![0.0; 4];
        region.accumulate_biases(chunk, [2, 1, 1], SIZE, &mut biases);
        assert!((biases[3] - 0.6).abs() < 1e-12);
    }
}
