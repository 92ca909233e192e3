//! Parallel chunk processing
//!
//! Jobs exchange plain data with worker threads; the processor schedules
//! them under fixed caps and commits results on the coordinating thread.

/// Flat job input and output and the worker-side job body
pub mod job;
/// Bounded job scheduler with single-threaded write-back
pub mod processor;

pub use job::{JobInput, JobOutput, JobType};
pub use processor::{ParallelWfcProcessor, ProcessorConfig, ProcessorStats, UnitState};
