//! Input/output, configuration and error handling

/// Command-line arguments and the generation runner
pub mod cli;
/// Generation constants and TOML run configuration
pub mod configuration;
/// Crate error type and result alias
pub mod error;
/// PNG export of world slices
pub mod image;
/// Line-oriented chunk persistence
pub mod persistence;
/// Progress display for generation runs
pub mod progress;
