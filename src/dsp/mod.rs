//! Augmentation Transforms
//!
//! Stochastic waveform transforms and their composition:
//! - `Transform`: probability gate + one `TransformOp` variant
//! - `Pipeline`: ordered or bounded-random sequence of transforms
//! - presets and the loss-driven `AdaptiveController`

mod adaptive;
mod chain;
mod distortion;
mod gain;
mod masking;
mod noise;
mod pitch;
mod polymix;
pub mod presets;
mod reverb;
mod stretch;
mod transform;

pub use adaptive::{
    default_base_transforms, AdaptiveConfig, AdaptiveController, DEFAULT_TARGET_LOSS, MIN_STRENGTH,
};
pub use chain::{Pipeline, TransformReport};
pub use distortion::Distortion;
pub use gain::Gain;
pub use masking::{FrequencyMasking, TimeMasking};
pub use noise::{AddNoise, NoiseColor};
pub use pitch::PitchShift;
pub use polymix::{MixPool, Polymix};
pub use presets::Preset;
pub use reverb::{impulse_response, Reverb};
pub use stretch::TimeStretch;
pub use transform::{Augment, Outcome, Transform, TransformKind, TransformOp};
