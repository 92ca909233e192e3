use crate::algorithm::bitset::StateId;
use crate::math::probability::{argmax, clamp_bias, force_threshold, normalize_weights};
use crate::spatial::cell::Cell;
use ndarray::Array3;

/// Find the uncollapsed cell with the smallest entropy above one
///
/// Ties go to the lowest row-major flattened index. Uninitialized cells
/// (entropy zero) are never selected.
pub fn select_min_entropy_cell(cells: &Array3<Cell>) -> Option<[usize; 3]> {
    let mut best: Option<(usize, [usize; 3])> = None;
    for cell in cells {
        let entropy = cell.entropy();
        if entropy <= 1 {
            continue;
        }
        if best.is_none_or(|(best_entropy, _)| entropy < best_entropy) {
            best = Some((entropy, cell.position()));
            if entropy == 2 {
                break;
            }
        }
    }
    best.map(|(_, position)| position)
}

/// Candidate states of one cell with normalized selection weights
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedStates {
    /// Candidate states in ascending order
    pub states: Vec<StateId>,
    /// Normalized weight per candidate
    pub weights: Vec<f64>,
    /// Largest clamped bias magnitude among candidates
    pub max_bias: f64,
}

impl WeightedStates {
    /// Weigh candidate states by `1 + bias`
    ///
    /// Each bias is scaled by `influence`, then clamped to [-1, 1]. States
    /// without a bias entry weigh one.
    pub fn from_biases(states: Vec<StateId>, biases: &[f64], influence: f64) -> Self {
        let mut max_bias: f64 = 0.0;
        let mut weights: Vec<f64> = states
            .iter()
            .map(|&state| {
                let bias = clamp_bias(biases.get(state).copied().unwrap_or(0.0) * influence);
                max_bias = max_bias.max(bias.abs());
                1.0 + bias
            })
            .collect();
        normalize_weights(&mut weights);
        Self {
            states,
            weights,
            max_bias,
        }
    }

    /// State whose weight exceeds the force threshold, if any
    pub fn forced_state(&self) -> Option<StateId> {
        let threshold = force_threshold(self.max_bias);
        let index = argmax(&self.weights)?;
        let weight = self.weights.get(index).copied()?;
        if weight > threshold {
            self.states.get(index).copied()
        } else {
            None
        }
    }
}
