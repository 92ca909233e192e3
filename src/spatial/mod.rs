//! Spatial data structures for chunked generation
//!
//! This module contains spatial-related functionality including:
//! - Face directions and their 2-D face parameterization
//! - Cells and their collapse state machine
//! - Chunks with dense and memory-optimized cell storage
//! - The authoritative map of loaded chunks

/// Constrained cell state machine
pub mod cell;
/// Cubic chunk lattice with LOD settings and optimized storage
pub mod chunk;
/// Authoritative chunk map with neighbor linking
pub mod chunk_map;
/// Face directions, offsets and face indexing
pub mod direction;

pub use cell::Cell;
pub use chunk::{Chunk, ChunkPosition, LodSettings};
pub use chunk_map::ChunkMap;
pub use direction::Direction;
