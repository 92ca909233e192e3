//! World-scale constraints queried per world position

use crate::algorithm::bitset::StateId;
use crate::math::interpolation::Cubic;
use std::collections::BTreeMap;

/// Type tag and type-specific parameters of a global constraint
#[derive(Clone, Debug, PartialEq)]
pub enum GlobalConstraintKind {
    /// Plain biome bias inside the influence box
    BiomeRegion,
    /// Bias additionally shaped by a per-state height preference curve
    HeightMap {
        /// World height mapped to curve input zero
        min_height: f64,
        /// World height mapped to curve input one
        max_height: f64,
        /// Preference curve per state over normalized height, missing states weigh one
        preferences: BTreeMap<StateId, Cubic>,
    },
    /// Bias additionally falling off with distance to a polyline
    RiverPath {
        /// River polyline in world coordinates
        control_points: Vec<[f64; 3]>,
        /// Full-strength half width around the polyline
        path_width: f64,
    },
    /// Placed structure footprint, evaluated like a biome region
    Structure,
}

/// Stateless world-scale bias source
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalConstraint {
    /// Name used for removal and diagnostics
    pub name: String,
    /// Type tag and parameters
    pub kind: GlobalConstraintKind,
    /// Inclusive lower corner of the influence box
    pub bounds_min: [f64; 3],
    /// Inclusive upper corner of the influence box
    pub bounds_max: [f64; 3],
    /// Distance over which influence falls linearly to zero outside the box
    pub blend_radius: f64,
    /// Scalar applied to every bias
    pub strength: f64,
    /// Bias per state, missing states are unbiased
    pub state_biases: BTreeMap<StateId, f64>,
}

impl GlobalConstraint {
    /// Create a constraint with full strength, no blending and no biases
    pub fn new(
        name: impl Into<String>,
        kind: GlobalConstraintKind,
        bounds_min: [f64; 3],
        bounds_max: [f64; 3],
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            bounds_min,
            bounds_max,
            blend_radius: 0.0,
            strength: 1.0,
            state_biases: BTreeMap::new(),
        }
    }

    /// Set the bias of one state
    #[must_use]
    pub fn with_bias(mut self, state: StateId, bias: f64) -> Self {
        self.state_biases.insert(state, bias);
        self
    }

    /// Set the strength scalar
    #[must_use]
    pub const fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Set the blend radius
    #[must_use]
    pub const fn with_blend_radius(mut self, blend_radius: f64) -> Self {
        self.blend_radius = blend_radius;
        self
    }

    /// Euclidean distance from a point to the influence box, zero inside
    pub fn distance_to_bounds(&self, world: [f64; 3]) -> f64 {
        (0..3)
            .map(|axis| {
                let v = world.get(axis).copied().unwrap_or(0.0);
                let lo = self.bounds_min.get(axis).copied().unwrap_or(0.0);
                let hi = self.bounds_max.get(axis).copied().unwrap_or(0.0);
                let outside = (lo - v).max(v - hi).max(0.0);
                outside * outside
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Influence in [0, 1]: one inside the box, linear falloff across the blend radius
    pub fn influence_at(&self, world: [f64; 3]) -> f64 {
        let distance = self.distance_to_bounds(world);
        if distance <= 0.0 {
            1.0
        } else if self.blend_radius > 0.0 && distance < self.blend_radius {
            1.0 - distance / self.blend_radius
        } else {
            0.0
        }
    }

    /// Unclamped bias contribution for one state at a world position
    pub fn bias_at(&self, world: [f64; 3], state: StateId) -> f64 {
        let Some(&bias) = self.state_biases.get(&state) else {
            return 0.0;
        };
        let influence = self.influence_at(world);
        if influence <= 0.0 {
            return 0.0;
        }
        let shaped = match &self.kind {
            GlobalConstraintKind::BiomeRegion | GlobalConstraintKind::Structure => 1.0,
            GlobalConstraintKind::HeightMap {
                min_height,
                max_height,
                preferences,
            } => {
                let span = max_height - min_height;
                let t = if span > 0.0 {
                    ((world[1] - min_height) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                preferences.get(&state).map_or(1.0, |curve| curve.evaluate(t))
            }
            GlobalConstraintKind::RiverPath {
                control_points,
                path_width,
            } => self.river_falloff(control_points, *path_width, world),
        };
        self.strength * bias * influence * shaped
    }

    fn river_falloff(&self, control_points: &[[f64; 3]], path_width: f64, world: [f64; 3]) -> f64 {
        let Some(distance) = distance_to_polyline(control_points, world) else {
            return 0.0;
        };
        if distance <= path_width {
            1.0
        } else if self.blend_radius > 0.0 && distance < path_width + self.blend_radius {
            1.0 - (distance - path_width) / self.blend_radius
        } else {
            0.0
        }
    }

    /// Add this constraint's contribution for every state to `biases`
    pub fn accumulate_biases(&self, world: [f64; 3], biases: &mut [f64]) {
        for &state in self.state_biases.keys() {
            let contribution = self.bias_at(world, state);
            if let Some(slot) = biases.get_mut(state) {
                *slot += contribution;
            }
        }
    }
}

/// Shortest distance from a point to a polyline, `None` without points
pub fn distance_to_polyline(points: &[[f64; 3]], world: [f64; 3]) -> Option<f64> {
    match points {
        [] => None,
        [single] => Some(distance(*single, world)),
        _ => points
            .windows(2)
            .filter_map(|segment| match segment {
                [a, b] => Some(distance_to_segment(*a, *b, world)),
                _ => None,
            })
            .reduce(f64::min),
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    d[2].mul_add(d[2], d[0].mul_add(d[0], d[1] * d[1])).sqrt()
}

fn distance_to_segment(a: [f64; 3], b: [f64; 3], p: [f64; 3]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ap = [p[0] - a[0], p[1] - a[1], p[2] - a[2]];
    let length_sq = ab[2].mul_add(ab[2], ab[0].mul_add(ab[0], ab[1] * ab[1]));
    if length_sq <= f64::EPSILON {
        return distance(a, p);
    }
    let t = (ab[2].mul_add(ap[2], ab[0].mul_add(ap[0], ab[1] * ap[1])) / length_sq).clamp(0.0, 1.0);
    distance(
        [ab[0].mul_add(t, a[0]), ab[1].mul_add(t, a[1]), ab[2].mul_add(t, a[2])],
        p,
    )
}
