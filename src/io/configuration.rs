//! Generation constants and runtime configuration defaults

use crate::constraints::presets::Preset;
use crate::io::error::{GenerationError, Result, invalid_parameter};
use crate::parallel::processor::ProcessorConfig;
use crate::spatial::chunk::LodSettings;
use serde::Deserialize;
use std::path::Path;

// Default values for configurable parameters
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;

/// Default chunk edge length in cells
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Default number of discrete cell states
pub const DEFAULT_STATE_COUNT: usize = 6;

/// Default number of chunks along each world axis
pub const DEFAULT_WORLD_CHUNKS: usize = 2;

/// Default iteration budget for collapse and propagation passes
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Constraint influence multiplier at full detail
pub const DEFAULT_CONSTRAINT_INFLUENCE: f64 = 1.0;

// Safety limits to prevent excessive memory allocation
/// Maximum allowed chunk edge length
pub const MAX_CHUNK_SIZE: usize = 128;
/// Maximum allowed number of states
pub const MAX_STATE_COUNT: usize = 1024;

// Force-collapse threshold lerps between these as the strongest bias grows
/// Force threshold with no bias present
pub const FORCE_THRESHOLD_UNBIASED: f64 = 0.9;
/// Force threshold at full bias magnitude
pub const FORCE_THRESHOLD_SATURATED: f64 = 0.5;

/// Priority reduction applied to boundary propagation events
pub const BOUNDARY_PRIORITY_BOOST: i64 = 100;

// Worker job contract limits
/// Maximum candidate states marshalled per cell into a job
pub const MAX_STATES_PER_CELL: usize = 32;

// Scheduler caps
/// Default hard cap on the pending queue
pub const DEFAULT_MAX_PENDING_JOBS: usize = 256;
/// Default stride between written-back cells
pub const DEFAULT_WRITE_BACK_STRIDE: usize = 1;

/// Default worker count and cap on chunks pending or running at once
///
/// Follows the host's available parallelism.
pub fn default_parallelism() -> usize {
    num_cpus::get().max(1)
}

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 50;

// Output settings
/// Extension of persisted chunk files
pub const CHUNK_FILE_EXTENSION: &str = "chunk";
/// Filename of the exported slice image
pub const SLICE_FILE_NAME: &str = "slice.png";

/// Run configuration loaded from TOML and overridden from the command line
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Seed for every random choice
    pub seed: u64,
    /// Chunk edge length in cells
    pub chunk_size: usize,
    /// Number of discrete states
    pub state_count: usize,
    /// Chunks along each world axis
    pub world_chunks: usize,
    /// Iteration budget at full detail
    pub max_iterations: usize,
    /// LOD level applied to every chunk
    pub lod_level: u8,
    /// Worker threads (automatic when absent)
    pub threads: Option<usize>,
    /// Cap on chunks pending or running at once
    pub max_concurrent_chunks: usize,
    /// Hard cap on the pending queue
    pub max_pending_jobs: usize,
    /// Stride between written-back cells
    pub write_back_stride: usize,
    /// Run chunks through the parallel processor
    pub parallel: bool,
    /// Constraint preset shaping the world
    pub preset: Preset,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            chunk_size: DEFAULT_CHUNK_SIZE,
            state_count: DEFAULT_STATE_COUNT,
            world_chunks: DEFAULT_WORLD_CHUNKS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            lod_level: 0,
            threads: None,
            max_concurrent_chunks: default_parallelism(),
            max_pending_jobs: DEFAULT_MAX_PENDING_JOBS,
            write_back_stride: DEFAULT_WRITE_BACK_STRIDE,
            parallel: false,
            preset: Preset::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a TOML document
    ///
    /// `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is out of range
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|source| GenerationError::Config {
            path: origin.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GenerationError::FileSystem {
            path: path.to_path_buf(),
            operation: "read configuration",
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Check every field against its allowed range
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(invalid_parameter(
                "chunk_size",
                &self.chunk_size,
                &format!("must be between 1 and {MAX_CHUNK_SIZE}"),
            ));
        }
        if self.state_count == 0 || self.state_count > MAX_STATE_COUNT {
            return Err(invalid_parameter(
                "state_count",
                &self.state_count,
                &format!("must be between 1 and {MAX_STATE_COUNT}"),
            ));
        }
        if self.world_chunks == 0 {
            return Err(invalid_parameter(
                "world_chunks",
                &self.world_chunks,
                &"must be positive",
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid_parameter(
                "max_iterations",
                &self.max_iterations,
                &"must be positive",
            ));
        }
        if self.threads == Some(0) {
            return Err(invalid_parameter("threads", &0, &"must be positive"));
        }
        if self.write_back_stride == 0 {
            return Err(invalid_parameter(
                "write_back_stride",
                &self.write_back_stride,
                &"must be positive",
            ));
        }
        Ok(())
    }

    /// Scheduler settings derived from this configuration
    pub fn processor_config(&self) -> ProcessorConfig {
        let defaults = ProcessorConfig::default();
        ProcessorConfig {
            max_threads: self.threads.unwrap_or(defaults.max_threads),
            max_concurrent_chunks: self.max_concurrent_chunks,
            max_pending_jobs: self.max_pending_jobs,
            write_back_stride: self.write_back_stride,
            seed: self.seed,
        }
    }

    /// LOD settings applied to every generated chunk
    pub fn lod_settings(&self) -> LodSettings {
        LodSettings::for_level(self.lod_level, self.max_iterations)
    }
}
