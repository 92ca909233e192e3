//! Mathematical utilities for constraint evaluation and state selection

/// Cubic splines, linear interpolation and smoothstep
pub mod interpolation;
/// Hashed lattice noise with trilinear smoothing
pub mod noise;
/// Weight normalization and force-collapse thresholds
pub mod probability;
