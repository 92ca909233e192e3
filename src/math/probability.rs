use crate::io::configuration::{FORCE_THRESHOLD_SATURATED, FORCE_THRESHOLD_UNBIASED};
use crate::math::interpolation::lerp;

/// Clamp a bias to the [-1, 1] range consumers operate on
pub fn clamp_bias(bias: f64) -> f64 {
    if bias.is_nan() { 0.0 } else { bias.clamp(-1.0, 1.0) }
}

/// Normalize weights in-place so they sum to one
///
/// Negative and non-finite weights count as zero. If nothing positive
/// remains the weights become uniform.
pub fn normalize_weights(weights: &mut [f64]) {
    for weight in weights.iter_mut() {
        if !weight.is_finite() || *weight < 0.0 {
            *weight = 0.0;
        }
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for weight in weights.iter_mut() {
            *weight /= total;
        }
    } else if !weights.is_empty() {
        let uniform = 1.0 / weights.len() as f64;
        weights.fill(uniform);
    }
}

/// Probability above which a state is chosen without sampling
///
/// Falls linearly from 0.9 with no bias to 0.5 at full bias magnitude.
pub fn force_threshold(max_bias_magnitude: f64) -> f64 {
    lerp(
        FORCE_THRESHOLD_UNBIASED,
        FORCE_THRESHOLD_SATURATED,
        max_bias_magnitude.abs(),
    )
}

/// Index of the largest weight, earliest on ties
pub fn argmax(weights: &[f64]) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, &weight)| match best {
            Some((_, best_weight)) if best_weight >= weight => best,
            _ => Some((index, weight)),
        })
        .map(|(index, _)| index)
}
