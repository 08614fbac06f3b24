//! Soft-clip distortion
//!
//! `tanh(x * drive) / drive` mixed 30% wet with the dry signal. Dividing by
//! the drive keeps small signals near unity gain while large peaks saturate.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::{ParamRange, Waveform};
use crate::error::Result;

/// Wet share of the output
const WET_MIX: f32 = 0.3;

/// Random tanh soft-clip
///
/// # Parameters
/// - `drive_range`: Interval the drive is drawn from (default 1 to 3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distortion {
    pub drive_range: ParamRange,
}

impl Default for Distortion {
    fn default() -> Self {
        Self {
            drive_range: ParamRange::new(1.0, 3.0),
        }
    }
}

impl Distortion {
    pub fn new(min_drive: f32, max_drive: f32) -> Self {
        Self {
            drive_range: ParamRange::new(min_drive, max_drive),
        }
    }
}

#[inline]
fn soft_clip(sample: f32, drive: f32) -> f32 {
    (sample * drive).tanh() / drive
}

impl Augment for Distortion {
    const KIND: TransformKind = TransformKind::Distortion;
    const DEFAULT_PROBABILITY: f32 = 0.15;

    fn validate(&self) -> Result<()> {
        self.drive_range.validate_above("drive_range", 0.0, false)
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let drive = self.drive_range.sample(rng);
        let mut output = waveform.clone();
        for channel in output.channels_mut() {
            for s in channel.iter_mut() {
                *s = (1.0 - WET_MIX) * *s + WET_MIX * soft_clip(*s, drive);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Seed;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_drive_formula() {
        let mut rng = Seed::new(1).to_rng();
        let input = Waveform::mono(vec![0.0, 0.5, -1.0, 2.0]);
        let out = Distortion::new(2.0, 2.0).apply(&input, 16000, &mut rng).unwrap();
        for (o, x) in out.iter_samples().zip(input.iter_samples()) {
            let expected = 0.7 * x + 0.3 * (2.0 * x).tanh() / 2.0;
            assert_relative_eq!(o, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_compresses_peaks() {
        let mut rng = Seed::new(2).to_rng();
        let input = Waveform::mono(vec![1.0; 8]);
        let out = Distortion::default().apply(&input, 16000, &mut rng).unwrap();
        assert!(out.iter_samples().all(|s| s < 1.0 && s > 0.7));
    }

    #[test]
    fn test_zero_drive_rejected() {
        assert!(Distortion::new(0.0, 2.0).validate().is_err());
        assert!(Distortion::default().validate().is_ok());
    }
}
