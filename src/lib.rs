//! Waveaug - Stochastic Waveform Augmentation
//!
//! Waveaug augments raw multi-channel audio during model training:
//! 1. Transforms - probability-gated gain, noise, pitch, stretch, masking,
//!    reverb, distortion and sample mixing
//! 2. Pipelines - ordered or bounded-random composition of transforms
//! 3. Adaptive control - augmentation strength tuned from training loss
//!
//! # Architecture
//!
//! - `engine`: waveform buffer, seedable randomness, spectral primitives,
//!   shape reconciliation, WAV I/O
//! - `dsp`: transforms, pipelines, presets, adaptive controller
//! - `config`: JSON pipeline documents
//!
//! The engine owns no random generator. Every randomized call takes a
//! caller-supplied `rand::Rng`; `engine::Seed` produces reproducible ones.
//!
//! # Example
//! ```
//! use waveaug::dsp::Preset;
//! use waveaug::engine::{Seed, Waveform};
//!
//! let pipeline = Preset::Moderate.build(false);
//! let mut rng = Seed::new(42).to_rng();
//! let input = Waveform::silence(2, 16000);
//! let output = pipeline.apply(&input, 16000, &mut rng);
//! assert_eq!(output.shape(), input.shape());
//! ```

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use config::PipelineConfig;
pub use dsp::{AdaptiveController, Pipeline, Preset, Transform};
pub use engine::{Seed, Waveform};
pub use error::{AugmentError, Result};
