//! Hierarchical constraints steering collapse probabilities
//!
//! Global constraints act at world scale, region constraints over boxes of
//! chunks. The hierarchy sums both into per-cell state biases.

/// World-scale biome, height, river and structure constraints
pub mod global;
/// Versioned combination of constraints with a per-chunk bias cache
pub mod hierarchy;
/// Named constraint factories
pub mod presets;
/// Chunk-box transitions and patterns
pub mod region;

pub use global::{GlobalConstraint, GlobalConstraintKind};
pub use hierarchy::HierarchicalConstraintSystem;
pub use presets::Preset;
pub use region::{PatternType, RegionConstraint, RegionKind};
