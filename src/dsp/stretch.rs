//! Time stretch
//!
//! Spectrogram-domain stretch that keeps the output length equal to the
//! input length. Only magnitudes are stretched; phase is rebuilt naively
//! as `m + i*m`, so the result is an approximation with audible smearing.
//! The natural resynthesis length is then trimmed or zero-padded back to
//! the input length, which means the output carries the stretched texture
//! rather than a longer or shorter signal.

use rand::Rng;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::reshape::fit_length;
use crate::engine::spectral::stretch_magnitudes;
use crate::engine::{ParamRange, Spectrogram, Stft, Waveform};
use crate::error::{AugmentError, Result};

const STFT: Stft = Stft::new(512, 128);

/// Random time stretch
///
/// # Parameters
/// - `rate_range`: Interval the stretch rate is drawn from (default 0.8 to
///   1.2); `rate > 1` speeds up, `rate < 1` slows down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStretch {
    pub rate_range: ParamRange,
}

impl Default for TimeStretch {
    fn default() -> Self {
        Self {
            rate_range: ParamRange::new(0.8, 1.2),
        }
    }
}

impl TimeStretch {
    pub fn new(min_rate: f32, max_rate: f32) -> Self {
        Self {
            rate_range: ParamRange::new(min_rate, max_rate),
        }
    }

    pub fn fixed(rate: f32) -> Self {
        Self {
            rate_range: ParamRange::fixed(rate),
        }
    }
}

fn stretch_channel(channel: &[f32], rate: f32) -> Result<Vec<f32>> {
    let spec = STFT.forward(channel)?;
    let stretched = stretch_magnitudes(&spec.magnitudes(), rate)?;
    let num_frames = stretched.len();
    let frames = stretched
        .into_iter()
        .map(|frame| frame.into_iter().map(|m| Complex::new(m, m)).collect())
        .collect();
    let spec = Spectrogram::new(frames, STFT.num_bins());

    let natural_len = STFT.hop_length * num_frames.saturating_sub(1);
    let resynth = STFT.inverse(&spec, natural_len)?;
    Ok(fit_length(&resynth, channel.len()))
}

impl Augment for TimeStretch {
    const KIND: TransformKind = TransformKind::TimeStretch;
    const DEFAULT_PROBABILITY: f32 = 0.3;

    fn validate(&self) -> Result<()> {
        self.rate_range.validate_above("rate_range", 0.0, false)?;
        if self.rate_range.max > 10.0 || self.rate_range.min < 0.1 {
            return Err(AugmentError::InvalidRange {
                param: "rate_range".to_string(),
                min: self.rate_range.min,
                max: self.rate_range.max,
            });
        }
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let rate = self.rate_range.sample(rng);
        let channels = waveform
            .channels()
            .map(|ch| stretch_channel(ch, rate))
            .collect::<Result<Vec<_>>>()?;
        Waveform::from_channels(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Seed;
    use test_case::test_case;

    fn chirp(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 16000.0;
                (2.0 * std::f32::consts::PI * (200.0 + 400.0 * t) * t).sin() * 0.4
            })
            .collect()
    }

    #[test_case(0.8 ; "slow down")]
    #[test_case(1.0 ; "unit rate")]
    #[test_case(1.2 ; "speed up")]
    fn test_length_preserved(rate: f32) {
        let mut rng = Seed::new(1).to_rng();
        let input = Waveform::broadcast(&chirp(3000), 2);
        let out = TimeStretch::fixed(rate).apply(&input, 16000, &mut rng).unwrap();
        assert_eq!(out.shape(), (2, 3000));
        assert!(out.is_finite());
    }

    #[test]
    fn test_output_differs_from_input() {
        let mut rng = Seed::new(2).to_rng();
        let input = Waveform::mono(chirp(2048));
        let out = TimeStretch::default().apply(&input, 16000, &mut rng).unwrap();
        assert_ne!(out, input);
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        assert!(TimeStretch::new(0.0, 1.2).validate().is_err());
        assert!(TimeStretch::new(-1.0, 1.0).validate().is_err());
        assert!(TimeStretch::default().validate().is_ok());
    }

    #[test]
    fn test_short_buffer_is_error() {
        let mut rng = Seed::new(3).to_rng();
        let err = TimeStretch::default()
            .apply(&Waveform::mono(vec![0.0; 100]), 16000, &mut rng)
            .unwrap_err();
        assert_eq!(err.error_code(), "BUFFER_TOO_SHORT");
    }
}
