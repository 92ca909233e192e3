//! Chunk-level progress display for generation runs

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use crate::spatial::chunk::ChunkPosition;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static CHUNK_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "[{{elapsed_precise}}] Chunks: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Progress over the chunks of one generation run
///
/// A quiet tracker counts without drawing anything.
pub struct GenerationProgress {
    bar: ProgressBar,
}

impl GenerationProgress {
    /// Create a tracker for `chunk_count` chunks
    pub fn new(chunk_count: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(chunk_count as u64)
        };
        bar.set_length(chunk_count as u64);
        bar.set_style(CHUNK_STYLE.clone());
        Self { bar }
    }

    /// Show the chunk currently being generated
    pub fn start_chunk(&self, position: ChunkPosition) {
        self.bar.set_message(format!("chunk {position}"));
    }

    /// Count `count` more chunks as finished
    pub fn complete_chunks(&self, count: usize) {
        self.bar.inc(count as u64);
    }

    /// Chunks finished so far
    pub fn completed(&self) -> u64 {
        self.bar.position()
    }

    /// Total chunks in the run
    pub fn total(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    /// Stop the display with a summary message, keeping the completed count
    pub fn finish(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}
