//! Tests for bias clamping, weight normalization and force thresholds

#[cfg(test)]
mod tests {
    use chunkwfc::math::probability::{argmax, clamp_bias, force_threshold, normalize_weights};

    // Tests bias clamping including NaN
    #[test]
    fn test_clamp_bias() {
        assert!((clamp_bias(2.5) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_bias(-7.0) + 1.0).abs() < f64::EPSILON);
        assert!((clamp_bias(0.3) - 0.3).abs() < f64::EPSILON);
        assert!(clamp_bias(f64::NAN).abs() < f64::EPSILON);
    }

    // Tests normalization drops invalid weights and sums to one
    #[test]
    fn test_normalize_weights() {
        let mut weights = [1.0, 3.0, -2.0, f64::INFINITY];
        normalize_weights(&mut weights);
        assert_eq!(weights, [0.25, 0.75, 0.0, 0.0]);

        let mut degenerate = [0.0, -1.0, f64::NAN, 0.0];
        normalize_weights(&mut degenerate);
        assert_eq!(degenerate, [0.25; 4]);

        let mut empty: [f64; 0] = [];
        normalize_weights(&mut empty);
    }

    // Tests the threshold falls from 0.9 to 0.5 with bias magnitude
    #[test]
    fn test_force_threshold() {
        assert!((force_threshold(0.0) - 0.9).abs() < 1e-12);
        assert!((force_threshold(1.0) - 0.5).abs() < 1e-12);
        assert!((force_threshold(-0.5) - 0.7).abs() < 1e-12);
    }

    // Tests argmax keeps the earliest maximum
    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.9]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
