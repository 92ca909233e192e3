//! Medium-scale constraints scoped to a box of whole chunks
//!
//! A region covers an inclusive range of chunk positions and an internal
//! normalized sub-box of it. Transitions blend two states along a direction
//! with hashed-noise jitter; patterns gate a bias map by a periodic or noisy
//! world-space function. Evaluation is pure and deterministic.

use crate::algorithm::bitset::StateId;
use crate::math::noise::{signed_noise, smooth_noise};
use crate::spatial::chunk::ChunkPosition;
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// World-space gate function of a pattern region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternType {
    /// Alternating slabs along X
    Stripes,
    /// Alternating cubes
    Checkerboard,
    /// Concentric rings around the region center in the XZ plane
    Radial,
    /// Archimedean spiral arms around the region center in the XZ plane
    Spiral,
    /// Smooth hashed noise
    Noise,
}

/// Behavior of a region constraint
#[derive(Clone, Debug, PartialEq)]
pub enum RegionKind {
    /// Blend from one state to another along a direction
    Transition {
        /// State favored at the start of the transition
        from: StateId,
        /// State favored at the end of the transition
        to: StateId,
        /// Direction the blend runs along
        direction: [f64; 3],
        /// World cells per noise lattice step
        noise_scale: f64,
        /// Maximum jitter added to the blend parameter
        noise_amplitude: f64,
    },
    /// Gate the state biases by a pattern
    Pattern {
        /// Gate function
        pattern: PatternType,
        /// World cells per pattern period
        scale: f64,
    },
}

/// Region-scale bias source
#[derive(Clone, Debug, PartialEq)]
pub struct RegionConstraint {
    /// Name used for removal and diagnostics
    pub name: String,
    /// Behavior
    pub kind: RegionKind,
    /// Inclusive lowest chunk of the region
    pub chunk_min: ChunkPosition,
    /// Inclusive highest chunk of the region
    pub chunk_max: ChunkPosition,
    /// Normalized lower corner of the active sub-box
    pub local_min: [f64; 3],
    /// Normalized upper corner of the active sub-box
    pub local_max: [f64; 3],
    /// Scalar applied to every bias
    pub strength: f64,
    /// Bias per state for pattern regions
    pub state_biases: BTreeMap<StateId, f64>,
    /// Seed for hashed noise
    pub seed: u64,
}

impl RegionConstraint {
    /// Create a region covering its whole chunk box at full strength
    pub fn new(
        name: impl Into<String>,
        kind: RegionKind,
        chunk_min: ChunkPosition,
        chunk_max: ChunkPosition,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            chunk_min,
            chunk_max,
            local_min: [0.0; 3],
            local_max: [1.0; 3],
            strength: 1.0,
            state_biases: BTreeMap::new(),
            seed: 0,
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

    /// Restrict influence to a normalized sub-box
    #[must_use]
    pub const fn with_local_bounds(mut self, local_min: [f64; 3], local_max: [f64; 3]) -> Self {
        self.local_min = local_min;
        self.local_max = local_max;
        self
    }

    /// Set the noise seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Whether the chunk lies inside the region's chunk box
    pub const fn contains_chunk(&self, position: ChunkPosition) -> bool {
        position.x >= self.chunk_min.x
            && position.x <= self.chunk_max.x
            && position.y >= self.chunk_min.y
            && position.y <= self.chunk_max.y
            && position.z >= self.chunk_min.z
            && position.z <= self.chunk_max.z
    }

    /// Normalized region coordinates of a cell, `None` outside the chunk box
    pub fn normalized_position(
        &self,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
    ) -> Option<[f64; 3]> {
        if !self.contains_chunk(chunk) || chunk_size == 0 {
            return None;
        }
        let world = chunk.world_position(chunk_size, local);
        let origin = self.chunk_min.world_origin(chunk_size);
        let min = self.chunk_min.to_array();
        let max = self.chunk_max.to_array();
        let mut normalized = [0.0; 3];
        for axis in 0..3 {
            let chunks = f64::from(max.get(axis)? - min.get(axis)? + 1);
            let extent = chunks * chunk_size as f64;
            let offset = (world.get(axis)? - origin.get(axis)?) as f64 + 0.5;
            *normalized.get_mut(axis)? = offset / extent;
        }
        Some(normalized)
    }

    /// Sub-box coordinates in [0, 1], `None` outside the sub-box
    fn sub_box_position(&self, normalized: [f64; 3]) -> Option<[f64; 3]> {
        let mut sub = [0.0; 3];
        for axis in 0..3 {
            let v = normalized.get(axis).copied()?;
            let lo = self.local_min.get(axis).copied()?;
            let hi = self.local_max.get(axis).copied()?;
            if v < lo || v > hi {
                return None;
            }
            let span = hi - lo;
            *sub.get_mut(axis)? = if span > 0.0 { (v - lo) / span } else { 0.5 };
        }
        Some(sub)
    }

    /// Unclamped bias contribution for one state at a cell
    pub fn bias_at(
        &self,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
        state: StateId,
    ) -> f64 {
        let Some(sub) = self
            .normalized_position(chunk, local, chunk_size)
            .and_then(|normalized| self.sub_box_position(normalized))
        else {
            return 0.0;
        };
        let world = chunk.world_position(chunk_size, local).map(|v| v as f64);

        match &self.kind {
            RegionKind::Transition {
                from,
                to,
                direction,
                noise_scale,
                noise_amplitude,
            } => {
                if state != *from && state != *to {
                    return 0.0;
                }
                let jitter = noise_amplitude * signed_noise(world, *noise_scale, self.seed);
                let t = (transition_parameter(sub, *direction) + jitter).clamp(0.0, 1.0);
                let mut bias = 0.0;
                if state == *from {
                    bias += self.strength * (1.0 - t);
                }
                if state == *to {
                    bias += self.strength * t;
                }
                bias
            }
            RegionKind::Pattern { pattern, scale } => {
                let Some(&bias) = self.state_biases.get(&state) else {
                    return 0.0;
                };
                let center = self.center_world(chunk_size);
                self.strength * bias * pattern_gate(*pattern, *scale, world, center, self.seed)
            }
        }
    }

    /// Add this region's contribution for every state to `biases`
    pub fn accumulate_biases(
        &self,
        chunk: ChunkPosition,
        local: [usize; 3],
        chunk_size: usize,
        biases: &mut [f64],
    ) {
        for (state, slot) in biases.iter_mut().enumerate() {
            *slot += self.bias_at(chunk, local, chunk_size, state);
        }
    }

    fn center_world(&self, chunk_size: usize) -> [f64; 3] {
        let lo = self.chunk_min.world_origin(chunk_size);
        let hi = self.chunk_max.world_origin(chunk_size);
        let size = chunk_size as f64;
        [
            (lo[0] + hi[0]) as f64 / 2.0 + size / 2.0,
            (lo[1] + hi[1]) as f64 / 2.0 + size / 2.0,
            (lo[2] + hi[2]) as f64 / 2.0 + size / 2.0,
        ]
    }
}

/// Project sub-box coordinates onto a direction, normalized to [0, 1] over the box
pub fn transition_parameter(sub: [f64; 3], direction: [f64; 3]) -> f64 {
    let mut dot = 0.0;
    let mut lowest = 0.0;
    let mut highest = 0.0;
    for (v, d) in sub.iter().zip(direction.iter()) {
        dot = v.mul_add(*d, dot);
        lowest += d.min(0.0);
        highest += d.max(0.0);
    }
    let span = highest - lowest;
    if span > 0.0 { (dot - lowest) / span } else { 0.5 }
}

/// Pattern gate in [0, 1] at a world position
pub fn pattern_gate(
    pattern: PatternType,
    scale: f64,
    world: [f64; 3],
    center: [f64; 3],
    seed: u64,
) -> f64 {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let parity = |value: f64| -> f64 {
        if (value.floor() as i64).rem_euclid(2) == 0 { 1.0 } else { 0.0 }
    };
    let dx = world[0] - center[0];
    let dz = world[2] - center[2];
    match pattern {
        PatternType::Stripes => parity(world[0] / scale),
        PatternType::Checkerboard => {
            let sum = (world[0] / scale).floor() + (world[1] / scale).floor() + (world[2] / scale).floor();
            parity(sum)
        }
        PatternType::Radial => parity(dx.hypot(dz) / scale),
        PatternType::Spiral => {
            let phase = dx.hypot(dz) / scale + dz.atan2(dx) / TAU;
            if phase.rem_euclid(1.0) < 0.5 { 1.0 } else { 0.0 }
        }
        PatternType::Noise => smooth_noise(world.map(|v| v / scale), seed),
    }
}
