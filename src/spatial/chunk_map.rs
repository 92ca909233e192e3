//! Authoritative map of loaded chunks
//!
//! The map owns every chunk and keeps neighbor links symmetric: inserting a
//! chunk links it with each loaded face neighbor and removing one unlinks it
//! and detaches the neighbors' boundary buffers that pointed at it.

use crate::spatial::chunk::{Chunk, ChunkPosition};
use crate::spatial::direction::Direction;
use std::collections::BTreeMap;

/// Loaded chunks keyed by chunk-space position
#[derive(Clone, Debug, Default)]
pub struct ChunkMap {
    chunks: BTreeMap<ChunkPosition, Chunk>,
}

impl ChunkMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loaded chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunks are loaded
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether a chunk is loaded at the position
    pub fn contains(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Borrow a loaded chunk
    pub fn get(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Mutably borrow a loaded chunk
    pub fn get_mut(&mut self, position: ChunkPosition) -> Option<&mut Chunk> {
        self.chunks.get_mut(&position)
    }

    /// Insert a chunk and link it with its loaded neighbors
    ///
    /// Returns the chunk previously stored at the same position.
    pub fn insert(&mut self, mut chunk: Chunk) -> Option<Chunk> {
        let position = chunk.position();
        for direction in Direction::ALL {
            let neighbor_position = position.neighbor(direction);
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_position) {
                let facing = direction.opposite();
                neighbor.set_neighbor(facing, Some(position));
                if let Some(buffer) = neighbor.boundary_buffer_mut(facing) {
                    buffer.set_adjacent(Some(position));
                }
                chunk.set_neighbor(direction, Some(neighbor_position));
            } else {
                chunk.set_neighbor(direction, None);
            }
        }
        self.chunks.insert(position, chunk)
    }

    /// Evict a chunk, unlinking it from its neighbors
    pub fn remove(&mut self, position: ChunkPosition) -> Option<Chunk> {
        let chunk = self.chunks.remove(&position)?;
        for (direction, neighbor_position) in chunk.neighbors() {
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_position) {
                let facing = direction.opposite();
                neighbor.set_neighbor(facing, None);
                if let Some(buffer) = neighbor.boundary_buffer_mut(facing) {
                    buffer.detach();
                }
            }
        }
        Some(chunk)
    }

    /// Loaded positions in ascending order
    pub fn positions(&self) -> Vec<ChunkPosition> {
        self.chunks.keys().copied().collect()
    }

    /// Iterate chunks in ascending position order
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    /// Mutably iterate chunks in ascending position order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> + '_ {
        self.chunks.values_mut()
    }

    /// Split a world cell coordinate into its chunk and local position
    pub fn locate(world: [i64; 3], chunk_size: usize) -> Option<(ChunkPosition, [usize; 3])> {
        if chunk_size == 0 {
            return None;
        }
        let size = chunk_size as i64;
        let chunk = ChunkPosition::new(
            i32::try_from(world[0].div_euclid(size)).ok()?,
            i32::try_from(world[1].div_euclid(size)).ok()?,
            i32::try_from(world[2].div_euclid(size)).ok()?,
        );
        let local = [
            world[0].rem_euclid(size) as usize,
            world[1].rem_euclid(size) as usize,
            world[2].rem_euclid(size) as usize,
        ];
        Some((chunk, local))
    }
}
