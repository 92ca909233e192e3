//! CLI entry point for chunked wave function collapse generation

use chunkwfc::io::cli::{Cli, Generator};
use clap::Parser;

fn main() -> chunkwfc::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    Generator::from_cli(&cli)?.run()?;
    Ok(())
}
