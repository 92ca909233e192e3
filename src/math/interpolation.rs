//! Curves used to shape constraint influence
//!
//! Cubic splines use natural boundary conditions where second derivatives are
//! zero at the endpoints. Knots are validated once at construction, so
//! evaluation is infallible and clamps to the boundary values outside the knot
//! range.

use crate::io::error::{GenerationError, Result};
use num_traits::Float;

/// Linear interpolation between `a` and `b` with `t` clamped to [0, 1]
pub fn lerp<T: Float>(a: T, b: T, t: T) -> T {
    let t = t.max(T::zero()).min(T::one());
    a + (b - a) * t
}

/// Hermite smoothstep of `t` clamped to [0, 1]
pub fn smoothstep<T: Float>(t: T) -> T {
    let t = t.max(T::zero()).min(T::one());
    let two = T::one() + T::one();
    let three = two + T::one();
    t * t * (three - two * t)
}

/// Cubic spline interpolation with natural boundary conditions
///
/// Provides C2 continuous interpolation through a set of knots using
/// piecewise cubic polynomials.
#[derive(Debug, Clone, PartialEq)]
pub struct Cubic {
    knots: Vec<(f64, f64)>,
    second_derivatives: Vec<f64>,
}

impl Cubic {
    /// Fit a spline through `(x, y)` knots
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `x_values` and `y_values` have different lengths
    /// - Fewer than 2 knots are provided
    /// - The x values are not finite and strictly increasing
    pub fn new(x_values: &[f64], y_values: &[f64]) -> Result<Self> {
        if x_values.len() != y_values.len() {
            return Err(interpolation_error(
                "x_values and y_values must have the same length",
            ));
        }
        if x_values.len() < 2 {
            return Err(interpolation_error("Need at least 2 points for interpolation"));
        }
        if x_values.iter().chain(y_values).any(|v| !v.is_finite()) {
            return Err(interpolation_error("knots must be finite"));
        }
        if x_values.windows(2).any(|pair| pair.first() >= pair.get(1)) {
            return Err(interpolation_error("x values must be strictly increasing"));
        }

        let knots: Vec<(f64, f64)> = x_values.iter().copied().zip(y_values.iter().copied()).collect();
        let second_derivatives = Self::solve_second_derivatives(&knots);
        Ok(Self {
            knots,
            second_derivatives,
        })
    }

    /// Flat curve returning `value` everywhere
    pub fn constant(value: f64) -> Self {
        Self {
            knots: vec![(0.0, value), (1.0, value)],
            second_derivatives: vec![0.0, 0.0],
        }
    }

    // Tridiagonal sweep over interior knots; endpoints stay zero
    fn solve_second_derivatives(knots: &[(f64, f64)]) -> Vec<f64> {
        let n = knots.len();
        let mut second = vec![0.0; n];
        let mut carry = vec![0.0; n];

        for (i, window) in knots.windows(3).enumerate() {
            let [(x0, y0), (x1, y1), (x2, y2)] = [
                window.first().copied().unwrap_or_default(),
                window.get(1).copied().unwrap_or_default(),
                window.get(2).copied().unwrap_or_default(),
            ];
            let sig = (x1 - x0) / (x2 - x0);
            let previous_second = second.get(i).copied().unwrap_or(0.0);
            let previous_carry = carry.get(i).copied().unwrap_or(0.0);
            let p = sig.mul_add(previous_second, 2.0);
            let slope_change = (y2 - y1) / (x2 - x1) - (y1 - y0) / (x1 - x0);
            if let Some(slot) = second.get_mut(i + 1) {
                *slot = (sig - 1.0) / p;
            }
            if let Some(slot) = carry.get_mut(i + 1) {
                *slot = sig.mul_add(-previous_carry, 6.0 * slope_change / (x2 - x0)) / p;
            }
        }

        if let Some(last) = second.last_mut() {
            *last = 0.0;
        }
        for k in (0..n.saturating_sub(1)).rev() {
            let next = second.get(k + 1).copied().unwrap_or(0.0);
            let c = carry.get(k).copied().unwrap_or(0.0);
            if let Some(slot) = second.get_mut(k) {
                *slot = slot.mul_add(next, c);
            }
        }
        second
    }

    /// Evaluate the spline at `x`, clamping outside the knot range
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) =
            (self.knots.first(), self.knots.last())
        else {
            return 0.0;
        };
        if x <= first_x {
            return first_y;
        }
        if x >= last_x {
            return last_y;
        }

        let hi = self.knots.partition_point(|&(knot_x, _)| knot_x <= x);
        let lo = hi.saturating_sub(1);
        let (Some(&(x_lo, y_lo)), Some(&(x_hi, y_hi))) = (self.knots.get(lo), self.knots.get(hi))
        else {
            return last_y;
        };
        let sd_lo = self.second_derivatives.get(lo).copied().unwrap_or(0.0);
        let sd_hi = self.second_derivatives.get(hi).copied().unwrap_or(0.0);

        let h = x_hi - x_lo;
        let a = (x_hi - x) / h;
        let b = (x - x_lo) / h;
        let curvature = (a.powi(3) - a).mul_add(sd_lo, (b.powi(3) - b) * sd_hi) * h.powi(2) / 6.0;
        a.mul_add(y_lo, b.mul_add(y_hi, curvature))
    }
}

fn interpolation_error(reason: &str) -> GenerationError {
    GenerationError::Interpolation {
        reason: reason.to_string(),
    }
}
