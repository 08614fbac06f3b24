//! Preset pipelines
//!
//! | Preset    | max_active | Transforms                                             |
//! |-----------|------------|--------------------------------------------------------|
//! | light     | 1          | gain, noise, time mask                                 |
//! | moderate  | 2          | gain, noise, pitch, stretch, freq mask, time mask, reverb |
//! | strong    | 3          | moderate set with wider ranges, plus distortion        |
//! | inference | 1          | gain, noise                                            |
//!
//! Every preset optionally appends a mix transform at probability 0.2.

use serde::{Deserialize, Serialize};

use crate::dsp::{
    AddNoise, Distortion, FrequencyMasking, Gain, NoiseColor, PitchShift, Pipeline, Polymix,
    Reverb, TimeMasking, TimeStretch, Transform,
};
use crate::engine::ParamRange;
use crate::error::{AugmentError, Result};

/// Probability of the optional mix transform
const MIX_PROBABILITY: f32 = 0.2;

/// Named pipeline configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Light,
    #[default]
    Moderate,
    Strong,
    Inference,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Light,
        Preset::Moderate,
        Preset::Strong,
        Preset::Inference,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Light => "light",
            Preset::Moderate => "moderate",
            Preset::Strong => "strong",
            Preset::Inference => "inference",
        }
    }

    /// Build the preset's pipeline
    pub fn build(&self, include_mix: bool) -> Pipeline {
        match self {
            Preset::Light => light(include_mix),
            Preset::Moderate => moderate(include_mix),
            Preset::Strong => strong(include_mix),
            Preset::Inference => inference(include_mix),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                AugmentError::invalid_parameter("preset", s, "light, moderate, strong or inference")
            })
    }
}

fn finish(mut transforms: Vec<Transform>, max_active: usize, include_mix: bool) -> Pipeline {
    if include_mix {
        transforms.push(Transform::from_parts(MIX_PROBABILITY, Polymix::default()));
    }
    Pipeline::from_parts(transforms, max_active)
}

fn white_noise(min: f32, max: f32) -> AddNoise {
    AddNoise::new(ParamRange::new(min, max), NoiseColor::White)
}

/// Mild training augmentation
pub fn light(include_mix: bool) -> Pipeline {
    finish(
        vec![
            Transform::from_parts(0.3, Gain::symmetric(3.0)),
            Transform::from_parts(0.1, white_noise(0.001, 0.005)),
            Transform::from_parts(0.1, TimeMasking::new(50, 1)),
        ],
        1,
        include_mix,
    )
}

/// Default training augmentation
pub fn moderate(include_mix: bool) -> Pipeline {
    finish(
        vec![
            Transform::from_parts(0.4, Gain::symmetric(4.0)),
            Transform::from_parts(0.2, white_noise(0.001, 0.01)),
            Transform::from_parts(0.3, PitchShift::symmetric(2.0)),
            Transform::from_parts(0.3, TimeStretch::new(0.85, 1.15)),
            Transform::from_parts(0.3, FrequencyMasking::new(80, 1)),
            Transform::from_parts(0.2, TimeMasking::new(100, 1)),
            Transform::from_parts(0.2, Reverb::default()),
        ],
        2,
        include_mix,
    )
}

/// Aggressive training augmentation
pub fn strong(include_mix: bool) -> Pipeline {
    finish(
        vec![
            Transform::from_parts(0.5, Gain::symmetric(8.0)),
            Transform::from_parts(0.3, white_noise(0.001, 0.02)),
            Transform::from_parts(0.4, PitchShift::symmetric(3.0)),
            Transform::from_parts(0.4, TimeStretch::new(0.7, 1.3)),
            Transform::from_parts(0.4, FrequencyMasking::new(120, 1)),
            Transform::from_parts(0.3, TimeMasking::new(200, 1)),
            Transform::from_parts(0.3, Reverb::default()),
            Transform::from_parts(0.2, Distortion::new(1.0, 4.0)),
        ],
        3,
        include_mix,
    )
}

/// Light test-time augmentation
pub fn inference(include_mix: bool) -> Pipeline {
    finish(
        vec![
            Transform::from_parts(0.3, Gain::symmetric(2.0)),
            Transform::from_parts(0.1, white_noise(0.001, 0.005)),
        ],
        1,
        include_mix,
    )
}
