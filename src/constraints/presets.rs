//! Named constraint factories for common terrain features
//!
//! Presets assume states are ordered from low to high terrain using the
//! role ids below. Biases for ids beyond a system's state count are ignored.

use crate::algorithm::bitset::StateId;
use crate::constraints::global::{GlobalConstraint, GlobalConstraintKind};
use crate::constraints::hierarchy::HierarchicalConstraintSystem;
use crate::constraints::region::{PatternType, RegionConstraint, RegionKind};
use crate::io::error::Result;
use crate::math::interpolation::Cubic;
use crate::spatial::chunk::ChunkPosition;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Open water
pub const WATER: StateId = 0;
/// Shoreline sand
pub const SAND: StateId = 1;
/// Open grass
pub const GRASS: StateId = 2;
/// Woodland
pub const FOREST: StateId = 3;
/// Bare rock
pub const ROCK: StateId = 4;
/// Snow caps
pub const SNOW: StateId = 5;

// Horizontal extent of presets that only constrain height
const UNBOUNDED: f64 = 1.0e9;

/// Height-driven mountain bias from sea level up to `height`
///
/// # Errors
///
/// Returns an error if a preference curve cannot be fitted
pub fn mountain(height: f64) -> Result<GlobalConstraint> {
    let mut preferences = BTreeMap::new();
    preferences.insert(GRASS, Cubic::new(&[0.0, 0.4, 1.0], &[1.0, 0.5, 0.0])?);
    preferences.insert(ROCK, Cubic::new(&[0.0, 0.5, 1.0], &[0.0, 0.7, 1.0])?);
    preferences.insert(SNOW, Cubic::new(&[0.0, 0.7, 1.0], &[0.0, 0.1, 1.0])?);

    Ok(GlobalConstraint::new(
        "mountain",
        GlobalConstraintKind::HeightMap {
            min_height: 0.0,
            max_height: height,
            preferences,
        },
        [-UNBOUNDED, 0.0, -UNBOUNDED],
        [UNBOUNDED, height, UNBOUNDED],
    )
    .with_blend_radius(height * 0.25)
    .with_bias(GRASS, 0.6)
    .with_bias(ROCK, 0.8)
    .with_bias(SNOW, 1.0))
}

/// Water along a polyline of `width` half-width, sand and no forest at its banks
pub fn river(points: Vec<[f64; 3]>, width: f64) -> GlobalConstraint {
    let mut bounds_min = [f64::INFINITY; 3];
    let mut bounds_max = [f64::NEG_INFINITY; 3];
    for point in &points {
        for axis in 0..3 {
            let v = point.get(axis).copied().unwrap_or(0.0);
            if let Some(lo) = bounds_min.get_mut(axis) {
                *lo = lo.min(v - width);
            }
            if let Some(hi) = bounds_max.get_mut(axis) {
                *hi = hi.max(v + width);
            }
        }
    }
    if points.is_empty() {
        bounds_min = [0.0; 3];
        bounds_max = [0.0; 3];
    }

    GlobalConstraint::new(
        "river",
        GlobalConstraintKind::RiverPath {
            control_points: points,
            path_width: width,
        },
        bounds_min,
        bounds_max,
    )
    .with_blend_radius(width)
    .with_bias(WATER, 1.0)
    .with_bias(SAND, 0.3)
    .with_bias(FOREST, -0.5)
}

/// Noisy woodland patches over a chunk box
///
/// `coverage` scales the bias; higher `density` shrinks the patches.
pub fn forest(
    coverage: f64,
    density: f64,
    chunk_min: ChunkPosition,
    chunk_max: ChunkPosition,
) -> RegionConstraint {
    let scale = 8.0 / density.max(0.05);
    RegionConstraint::new(
        "forest",
        RegionKind::Pattern {
            pattern: PatternType::Noise,
            scale,
        },
        chunk_min,
        chunk_max,
    )
    .with_strength(coverage.clamp(0.0, 1.0))
    .with_bias(FOREST, 1.0)
    .with_bias(GRASS, 0.3)
}

/// Sand band of `width` around the waterline at `height`
///
/// # Errors
///
/// Returns an error if the preference curve cannot be fitted
pub fn beach(height: f64, width: f64) -> Result<GlobalConstraint> {
    let mut preferences = BTreeMap::new();
    preferences.insert(SAND, Cubic::new(&[0.0, 0.5, 1.0], &[0.3, 1.0, 0.3])?);
    preferences.insert(WATER, Cubic::new(&[0.0, 0.5, 1.0], &[1.0, 0.2, 0.0])?);

    Ok(GlobalConstraint::new(
        "beach",
        GlobalConstraintKind::HeightMap {
            min_height: height - width,
            max_height: height + width,
            preferences,
        },
        [-UNBOUNDED, height - width, -UNBOUNDED],
        [UNBOUNDED, height + width, UNBOUNDED],
    )
    .with_blend_radius(width)
    .with_bias(SAND, 1.0)
    .with_bias(WATER, 0.4))
}

/// Blend from one state to another along `direction` over a chunk box
pub fn transition(
    from: StateId,
    to: StateId,
    direction: [f64; 3],
    chunk_min: ChunkPosition,
    chunk_max: ChunkPosition,
) -> RegionConstraint {
    RegionConstraint::new(
        format!("transition {from}->{to}"),
        RegionKind::Transition {
            from,
            to,
            direction,
            noise_scale: 4.0,
            noise_amplitude: 0.1,
        },
        chunk_min,
        chunk_max,
    )
}

/// Preset selectable from the command line and configuration files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// No constraints
    Flat,
    /// Height-driven mountains
    #[default]
    Mountain,
    /// A river crossing the world diagonally
    River,
    /// Noisy forest patches
    Forest,
    /// A beach band around a low waterline
    Beach,
    /// Lowest state blending into the highest along X
    Transition,
}

impl Preset {
    /// Register this preset's constraints for a cubic world of `world_chunks` per axis
    ///
    /// # Errors
    ///
    /// Returns an error if a preset curve cannot be fitted
    pub fn apply(
        self,
        system: &mut HierarchicalConstraintSystem,
        world_chunks: usize,
        chunk_size: usize,
        seed: u64,
    ) -> Result<()> {
        let extent = (world_chunks * chunk_size) as f64;
        let last = i32::try_from(world_chunks.saturating_sub(1)).unwrap_or(i32::MAX);
        let chunk_min = ChunkPosition::new(0, 0, 0);
        let chunk_max = ChunkPosition::new(last, last, last);

        match self {
            Self::Flat => {}
            Self::Mountain => system.add_global_constraint(mountain(extent)?),
            Self::River => {
                let y = extent * 0.25;
                let points = vec![
                    [0.0, y, 0.0],
                    [extent * 0.5, y, extent * 0.4],
                    [extent, y, extent],
                ];
                system.add_global_constraint(river(points, (extent / 8.0).max(1.0)));
            }
            Self::Forest => {
                system.add_region_constraint(
                    forest(0.8, 0.5, chunk_min, chunk_max).with_seed(seed),
                );
            }
            Self::Beach => {
                system.add_global_constraint(beach(extent * 0.3, (extent / 8.0).max(1.0))?);
            }
            Self::Transition => {
                let to = system.state_count().saturating_sub(1);
                system.add_region_constraint(
                    transition(WATER, to, [1.0, 0.0, 0.0], chunk_min, chunk_max).with_seed(seed),
                );
            }
        }
        Ok(())
    }
}
