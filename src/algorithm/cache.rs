use crate::spatial::chunk::ChunkPosition;
use ndarray::Array4;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Per-chunk bias volume tagged with the constraint version it was built from
#[derive(Clone, Debug)]
struct CachedBiases {
    version: u64,
    biases: Array4<f64>,
}

/// Memoization cache for per-chunk global constraint biases
///
/// Volumes are indexed `[x, y, z, state]`. An entry is only served while its
/// version matches the caller's current constraint version; stale entries are
/// rebuilt in place or dropped by [`BiasCache::prune_stale`].
#[derive(Debug, Default)]
pub struct BiasCache {
    entries: HashMap<ChunkPosition, CachedBiases>,

    /// Cache performance statistics
    pub stats: CacheStats,
}

/// Performance metrics for cache effectiveness
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses, including stale rebuilds
    pub misses: usize,
}

impl BiasCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the cached volume or compute and store a new one
    pub fn get_or_compute<F>(
        &mut self,
        position: ChunkPosition,
        version: u64,
        compute_fn: F,
    ) -> &Array4<f64>
    where
        F: FnOnce() -> Array4<f64>,
    {
        match self.entries.entry(position) {
            Entry::Occupied(entry) => {
                let cached = entry.into_mut();
                if cached.version == version {
                    self.stats.hits += 1;
                } else {
                    self.stats.misses += 1;
                    cached.version = version;
                    cached.biases = compute_fn();
                }
                &cached.biases
            }
            Entry::Vacant(entry) => {
                self.stats.misses += 1;
                &entry
                    .insert(CachedBiases {
                        version,
                        biases: compute_fn(),
                    })
                    .biases
            }
        }
    }

    /// Whether a volume built at `version` is cached for the chunk
    pub fn is_current(&self, position: ChunkPosition, version: u64) -> bool {
        self.peek(position, version).is_some()
    }

    /// Current volume without touching the statistics
    pub fn peek(&self, position: ChunkPosition, version: u64) -> Option<&Array4<f64>> {
        self.entries
            .get(&position)
            .filter(|cached| cached.version == version)
            .map(|cached| &cached.biases)
    }

    /// Drop the cached volume of one chunk
    ///
    /// Returns whether a volume was cached.
    pub fn evict(&mut self, position: ChunkPosition) -> bool {
        self.entries.remove(&position).is_some()
    }

    /// Drop every volume not built at `version`
    ///
    /// Returns the number of volumes dropped.
    pub fn prune_stale(&mut self, version: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.version == version);
        before - self.entries.len()
    }

    /// Drop every cached volume
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached volumes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
