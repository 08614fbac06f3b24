//! CLI Module
//!
//! Command-line interface for running augmentation pipelines on WAV files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Waveaug - stochastic waveform augmentation
#[derive(Parser, Debug)]
#[command(name = "waveaug")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Augment a WAV file
    #[command(name = "augment")]
    Augment {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file; with --count > 1, variants are numbered
        output: PathBuf,

        /// Preset pipeline (light, moderate, strong, inference)
        #[arg(short, long, default_value = "moderate", conflicts_with = "config")]
        preset: String,

        /// JSON pipeline config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// WAV files to mix in (adds a mix transform to presets)
        #[arg(short, long)]
        mix: Vec<PathBuf>,

        /// Directory searched recursively for WAV files to mix in
        #[arg(long)]
        mix_dir: Option<PathBuf>,

        /// Number of augmented variants to write
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 32)]
        bit_depth: u16,
    },

    /// Print the JSON config of a preset
    #[command(name = "preset")]
    Preset {
        /// Preset name
        name: String,

        /// Include the mix transform
        #[arg(long)]
        include_mix: bool,
    },
}
