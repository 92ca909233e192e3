//! Chunked wave function collapse for large procedural volumes
//!
//! Each chunk collapses independently under a shared adjacency table while
//! boundary buffers keep neighboring chunks consistent. Hierarchical constraints
//! bias the stochastic choices at world and region scale, and a parallel
//! processor runs per-chunk jobs on worker threads with a single commit point.

#![forbid(unsafe_code)]

/// Collapse, propagation, adjacency rules and the boundary buffer protocol
pub mod algorithm;
/// Global and region constraints combined into per-cell state biases
pub mod constraints;
/// Configuration, persistence, error handling and the command-line front end
pub mod io;
/// Interpolation, hashed noise and probability helpers
pub mod math;
/// Worker-thread job contract and the chunk job scheduler
pub mod parallel;
/// Cells, chunks, directions and the authoritative chunk map
pub mod spatial;

pub use io::error::{GenerationError, Result};
