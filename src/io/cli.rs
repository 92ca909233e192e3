//! Command-line interface for generating and saving a world of chunks

use crate::algorithm::adjacency::AdjacencyRules;
use crate::algorithm::executor::{CollapseStats, WfcCore};
use crate::constraints::hierarchy::HierarchicalConstraintSystem;
use crate::constraints::presets::Preset;
use crate::io::configuration::{GeneratorConfig, SLICE_FILE_NAME};
use crate::io::error::{GenerationError, Result};
use crate::io::image::export_slice_png;
use crate::io::persistence::save_chunk;
use crate::io::progress::GenerationProgress;
use crate::parallel::job::JobType;
use crate::parallel::processor::{ParallelWfcProcessor, ProcessorStats};
use crate::spatial::chunk::{Chunk, ChunkPosition};
use crate::spatial::chunk_map::ChunkMap;
use clap::Parser;
use log::{info, warn};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

// Neighboring states may differ by at most this much in generated worlds
const RULE_TOLERANCE: usize = 1;

#[derive(Parser, Debug)]
#[command(name = "chunkwfc")]
#[command(
    author,
    version,
    about = "Generate a chunked voxel world with wave function collapse"
)]
/// Command-line arguments for world generation
///
/// Options left unset fall back to the configuration file, then to defaults.
pub struct Cli {
    /// Directory receiving chunk files and the slice image
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Random seed for reproducible generation
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Chunks along each world axis
    #[arg(short = 'n', long)]
    pub world_chunks: Option<usize>,

    /// Chunk edge length in cells
    #[arg(short = 'C', long)]
    pub chunk_size: Option<usize>,

    /// Number of discrete cell states
    #[arg(short = 'k', long)]
    pub states: Option<usize>,

    /// Iteration budget per chunk at full detail
    #[arg(short, long)]
    pub iterations: Option<usize>,

    /// Worker threads for parallel generation
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Level of detail applied to every chunk
    #[arg(short, long)]
    pub lod: Option<u8>,

    /// Constraint preset shaping the world
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Run chunk jobs on the worker pool
    #[arg(short, long)]
    pub parallel: bool,

    /// Export the horizontal slice at this world height as PNG
    #[arg(long, value_name = "Y")]
    pub slice: Option<i64>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Merge the configuration file, if any, with command-line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or the
    /// merged configuration is invalid
    pub fn resolve_config(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(world_chunks) = self.world_chunks {
            config.world_chunks = world_chunks;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(states) = self.states {
            config.state_count = states;
        }
        if let Some(iterations) = self.iterations {
            config.max_iterations = iterations;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(lod) = self.lod {
            config.lod_level = lod;
        }
        if let Some(preset) = self.preset {
            config.preset = preset;
        }
        config.parallel |= self.parallel;
        config.validate()?;
        Ok(config)
    }
}

/// Summary of one generation run
#[derive(Clone, Debug)]
pub struct GenerationReport {
    /// Chunks generated
    pub chunks: usize,
    /// Cells across all chunks
    pub total_cells: usize,
    /// Cells that ended collapsed
    pub collapsed_cells: usize,
    /// Collapse and propagation counts
    pub collapse_stats: CollapseStats,
    /// Boundary conflicts left after the final synchronization
    pub conflicts: usize,
    /// Scheduler counts for parallel runs
    pub processor_stats: Option<ProcessorStats>,
    /// Chunk files written
    pub saved_chunks: Vec<PathBuf>,
    /// Slice image written, if requested
    pub slice_path: Option<PathBuf>,
}

/// Runs a full generation from a resolved configuration
pub struct Generator {
    config: GeneratorConfig,
    output: PathBuf,
    slice: Option<i64>,
    quiet: bool,
}

impl Generator {
    /// Create a generator writing into `output`
    pub const fn new(
        config: GeneratorConfig,
        output: PathBuf,
        slice: Option<i64>,
        quiet: bool,
    ) -> Self {
        Self {
            config,
            output,
            slice,
            quiet,
        }
    }

    /// Resolve the command line into a generator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be resolved
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self::new(
            cli.resolve_config()?,
            cli.output.clone(),
            cli.slice,
            !cli.should_show_progress(),
        ))
    }

    /// Configuration in use
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the world map of uninitialized chunks in ascending position order
    pub fn build_map(&self) -> ChunkMap {
        let mut map = ChunkMap::new();
        let lod = self.config.lod_settings();
        let extent = i32::try_from(self.config.world_chunks).unwrap_or(i32::MAX);
        for x in 0..extent {
            for y in 0..extent {
                for z in 0..extent {
                    let mut chunk = Chunk::new(
                        ChunkPosition::new(x, y, z),
                        self.config.chunk_size,
                        self.config.state_count,
                    );
                    chunk.set_lod(lod);
                    map.insert(chunk);
                }
            }
        }
        map
    }

    /// Generate the world without saving anything
    ///
    /// # Errors
    ///
    /// Returns an error if a preset cannot be built, the worker pool cannot
    /// start or a chunk goes missing mid-run
    pub fn generate(&self) -> Result<(ChunkMap, GenerationReport)> {
        let config = &self.config;
        let mut constraints = HierarchicalConstraintSystem::new(config.state_count);
        config.preset.apply(
            &mut constraints,
            config.world_chunks,
            config.chunk_size,
            config.seed,
        )?;

        let rules = AdjacencyRules::banded(config.state_count, RULE_TOLERANCE);
        let mut core = WfcCore::new(rules, config.seed);
        let mut map = self.build_map();
        for position in map.positions() {
            core.initialize_chunk(&mut map, position)?;
        }

        let progress = GenerationProgress::new(map.len(), self.quiet);
        let processor_stats = if config.parallel {
            Some(self.generate_parallel(&mut core, &mut map, &progress)?)
        } else {
            for position in map.positions() {
                progress.start_chunk(position);
                core.collapse_chunk(&mut map, &mut constraints, position)?;
                progress.complete_chunks(1);
            }
            None
        };

        let remaining = core.propagate(&mut map, config.max_iterations);
        core.stats.merge(&remaining);
        let sync = core.synchronize_boundaries(&mut map);
        let settled = core.propagate(&mut map, config.max_iterations);
        core.stats.merge(&settled);
        let conflicts = core.validate_boundaries(&map);
        if !conflicts.is_empty() {
            warn!("{} boundary conflicts remain after synchronization", conflicts.len());
        }
        progress.finish("done");

        let report = GenerationReport {
            chunks: map.len(),
            total_cells: map.iter().map(Chunk::cell_count).sum(),
            collapsed_cells: map.iter().map(Chunk::collapsed_count).sum(),
            collapse_stats: core.stats,
            conflicts: conflicts.len(),
            processor_stats,
            saved_chunks: Vec::new(),
            slice_path: None,
        };
        info!(
            "Generated {} chunks: {}/{} cells collapsed, {} narrowed at boundaries, {} conflicts",
            report.chunks, report.collapsed_cells, report.total_cells, sync.narrowed, report.conflicts
        );
        Ok((map, report))
    }

    fn generate_parallel(
        &self,
        core: &mut WfcCore,
        map: &mut ChunkMap,
        progress: &GenerationProgress,
    ) -> Result<ProcessorStats> {
        let mut processor = ParallelWfcProcessor::new(self.config.processor_config())?;
        let mut waiting: VecDeque<ChunkPosition> = map.positions().into();
        let budget = self.config.lod_settings().max_iterations;
        let mut priority = 0;

        while !waiting.is_empty() || !processor.is_idle() {
            while let Some(&position) = waiting.front() {
                if !processor.queue_chunk_for_processing(
                    map,
                    position,
                    JobType::FullCollapse,
                    budget,
                    priority,
                ) {
                    break;
                }
                progress.start_chunk(position);
                waiting.pop_front();
                priority += 1;
            }
            if let Some(&position) = waiting.front()
                && processor.is_idle()
            {
                return Err(GenerationError::ChunkNotFound { position });
            }

            processor.update(map);
            let committed = processor.process_completed_jobs(map);
            progress.complete_chunks(committed);
            processor.process_main_thread_events(core, map, self.config.max_iterations);
            if committed == 0 {
                std::thread::yield_now();
            }
        }

        processor.stop();
        Ok(processor.stats())
    }

    /// Generate the world, save every chunk and optionally export a slice
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails or an output file cannot be written
    pub fn run(&self) -> Result<GenerationReport> {
        let start = Instant::now();
        let (map, mut report) = self.generate()?;

        for chunk in map.iter() {
            report.saved_chunks.push(save_chunk(chunk, &self.output)?);
        }

        if let Some(world_y) = self.slice {
            let path = self.slice_path();
            export_slice_png(&map, self.config.chunk_size, world_y, &path)?;
            report.slice_path = Some(path);
        }

        info!(
            "Saved {} chunks to {} in {:.2?}",
            report.saved_chunks.len(),
            self.output.display(),
            start.elapsed()
        );
        Ok(report)
    }

    fn slice_path(&self) -> PathBuf {
        self.output.join(SLICE_FILE_NAME)
    }
}
