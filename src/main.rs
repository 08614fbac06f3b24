//! Waveaug CLI - Waveform Augmentation
//!
//! Command-line interface for running augmentation pipelines on WAV files.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use waveaug::cli::commands::{self, AugmentOptions};
use waveaug::cli::{Cli, Commands};
use waveaug::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Waveaug v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Waveaug v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Augment {
            input,
            output,
            preset,
            config,
            seed,
            mix,
            mix_dir,
            count,
            bit_depth,
        } => {
            let options = AugmentOptions {
                input,
                output,
                preset: preset.parse()?,
                config,
                seed,
                mix,
                mix_dir,
                count,
                bit_depth,
            };
            commands::augment(&options).map(|_| ())
        }
        Commands::Preset { name, include_mix } => commands::print_preset(&name, include_mix),
    }
}
