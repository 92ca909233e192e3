//! Tests for world-scale constraints and their influence falloff

#[cfg(test)]
mod tests {
    use chunkwfc::constraints::global::{GlobalConstraint, GlobalConstraintKind, distance_to_polyline};
    use chunkwfc::math::interpolation::Cubic;
    use std::collections::BTreeMap;

    fn biome() -> GlobalConstraint {
        GlobalConstraint::new(
            "meadow",
            GlobalConstraintKind::BiomeRegion,
            [0.0, 0.0, 0.0],
            [10.0, 10.0, 10.0],
        )
        .with_bias(2, 0.8)
    }

    // Tests influence is full inside the box and fades across the blend radius
    #[test]
    fn test_influence_falloff() {
        let constraint = biome().with_blend_radius(4.0);
        assert!((constraint.influence_at([5.0, 5.0, 5.0]) - 1.0).abs() < f64::EPSILON);
        assert!((constraint.influence_at([10.0, 0.0, 0.0]) - 1.0).abs() < f64::EPSILON);
        assert!((constraint.influence_at([12.0, 5.0, 5.0]) - 0.5).abs() < 1e-12);
        assert!(constraint.influence_at([14.0, 5.0, 5.0]).abs() < f64::EPSILON);

        let hard = biome();
        assert!(hard.influence_at([10.5, 5.0, 5.0]).abs() < f64::EPSILON);
    }

    // Tests distance to the box is Euclidean over every outside axis
    #[test]
    fn test_distance_to_bounds() {
        let constraint = biome();
        assert!(constraint.distance_to_bounds([3.0, 3.0, 3.0]).abs() < f64::EPSILON);
        assert!((constraint.distance_to_bounds([13.0, 14.0, 5.0]) - 5.0).abs() < 1e-12);
        assert!((constraint.distance_to_bounds([-2.0, 5.0, 5.0]) - 2.0).abs() < 1e-12);
    }

    // Tests bias is strength times bias times influence and unbiased states get zero
    #[test]
    fn test_bias_at() {
        let constraint = biome().with_strength(0.5).with_blend_radius(2.0);
        assert!((constraint.bias_at([1.0, 1.0, 1.0], 2) - 0.4).abs() < 1e-12);
        assert!((constraint.bias_at([11.0, 1.0, 1.0], 2) - 0.2).abs() < 1e-12);
        assert!(constraint.bias_at([1.0, 1.0, 1.0], 0).abs() < f64::EPSILON);
        assert!(constraint.bias_at([50.0, 1.0, 1.0], 2).abs() < f64::EPSILON);
    }

    // Tests height preferences shape the bias over normalized height
    #[test]
    fn test_height_map_preferences() {
        let mut preferences = BTreeMap::new();
        preferences.insert(4, Cubic::new(&[0.0, 1.0], &[0.0, 1.0]).expect("valid knots"));
        let constraint = GlobalConstraint::new(
            "peaks",
            GlobalConstraintKind::HeightMap {
                min_height: 0.0,
                max_height: 20.0,
                preferences,
            },
            [-100.0, -100.0, -100.0],
            [100.0, 100.0, 100.0],
        )
        .with_bias(4, 1.0)
        .with_bias(1, -0.5);

        assert!((constraint.bias_at([0.0, 5.0, 0.0], 4) - 0.25).abs() < 1e-12);
        assert!((constraint.bias_at([0.0, 40.0, 0.0], 4) - 1.0).abs() < 1e-12);
        assert!((constraint.bias_at([0.0, 5.0, 0.0], 1) + 0.5).abs() < 1e-12);
    }

    // Tests river bias is full along the path and fades beyond its width
    #[test]
    fn test_river_path_falloff() {
        let constraint = GlobalConstraint::new(
            "river",
            GlobalConstraintKind::RiverPath {
                control_points: vec![[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]],
                path_width: 2.0,
            },
            [-50.0, -50.0, -50.0],
            [50.0, 50.0, 50.0],
        )
        .with_bias(0, 1.0)
        .with_blend_radius(4.0);

        assert!((constraint.bias_at([10.0, 0.0, 1.5], 0) - 1.0).abs() < 1e-12);
        assert!((constraint.bias_at([10.0, 0.0, 4.0], 0) - 0.5).abs() < 1e-12);
        assert!(constraint.bias_at([10.0, 0.0, 7.0], 0).abs() < f64::EPSILON);
    }

    // Tests polyline distance uses the nearest segment and clamps to endpoints
    #[test]
    fn test_distance_to_polyline() {
        assert_eq!(distance_to_polyline(&[], [0.0; 3]), None);
        let single = distance_to_polyline(&[[3.0, 4.0, 0.0]], [0.0; 3]).expect("one point");
        assert!((single - 5.0).abs() < 1e-12);

        let path = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 10.0, 0.0]];
        let near_corner = distance_to_polyline(&path, [12.0, 5.0, 0.0]).expect("segments");
        assert!((near_corner - 2.0).abs() < 1e-12);
        let past_start = distance_to_polyline(&path, [-3.0, 0.0, 4.0]).expect("segments");
        assert!((past_start - 5.0).abs() < 1e-12);
    }

    // Tests accumulation adds onto existing biases and ignores out-of-range states
    #[test]
    fn test_accumulate_biases() {
        let constraint = biome().with_bias(9, 1.0);
        let mut biases = vec![0.1, 0.0, 0.1];
        constraint.accumulate_biases([2.0, 2.0, 2.0], &mut biases);
        assert!((biases[2] - 0.9).abs() < 1e-12);
        assert!((biases[0] - 0.1).abs() < f64::EPSILON);
        assert_eq!(biases.len(), 3);
    }
}
