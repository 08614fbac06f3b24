//! Pitch shift
//!
//! Shifts pitch by a random number of semitones while keeping duration:
//! 1. phase-vocoder time stretch by `rate = 2^(-semitones/12)`
//! 2. linear resample by `rate` to restore the original duration
//! 3. trim or zero-pad to the exact input length

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::reshape::fit_length;
use crate::engine::spectral::{phase_vocoder, resample_linear};
use crate::engine::{ParamRange, Stft, Waveform};
use crate::error::{AugmentError, Result};

const STFT: Stft = Stft::new(512, 128);

/// Largest shift a configuration may ask for
const MAX_SEMITONES: f32 = 24.0;

/// Random pitch shift
///
/// # Parameters
/// - `semitone_range`: Interval the shift is drawn from (default ±2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchShift {
    pub semitone_range: ParamRange,
}

impl Default for PitchShift {
    fn default() -> Self {
        Self {
            semitone_range: ParamRange::new(-2.0, 2.0),
        }
    }
}

impl PitchShift {
    pub fn symmetric(max_semitones: f32) -> Self {
        Self {
            semitone_range: ParamRange::new(-max_semitones, max_semitones),
        }
    }

    pub fn fixed(semitones: f32) -> Self {
        Self {
            semitone_range: ParamRange::fixed(semitones),
        }
    }
}

/// Shift one channel by `semitones`
fn shift_channel(channel: &[f32], semitones: f32, sample_rate: u32) -> Result<Vec<f32>> {
    let rate = 2.0_f32.powf(-semitones / 12.0);
    let len = channel.len();

    let spec = STFT.forward(channel)?;
    let stretched_spec = phase_vocoder(&spec, rate, STFT.hop_length)?;
    let stretched_len = (len as f32 / rate).round() as usize;
    let stretched = STFT.inverse(&stretched_spec, stretched_len)?;

    // Treat the stretched signal as recorded at sample_rate / rate and
    // bring it back to sample_rate
    let source_rate = (sample_rate as f64 / rate as f64).round();
    if source_rate < 1.0 {
        return Err(AugmentError::numerical(format!(
            "sample rate {} too low to shift by {} semitones",
            sample_rate, semitones
        )));
    }
    let resampled = resample_linear(&stretched, sample_rate as f64 / source_rate)?;
    Ok(fit_length(&resampled, len))
}

impl Augment for PitchShift {
    const KIND: TransformKind = TransformKind::PitchShift;
    const DEFAULT_PROBABILITY: f32 = 0.3;

    fn validate(&self) -> Result<()> {
        self.semitone_range.validate("semitone_range")?;
        if self.semitone_range.min < -MAX_SEMITONES || self.semitone_range.max > MAX_SEMITONES {
            return Err(AugmentError::InvalidRange {
                param: "semitone_range".to_string(),
                min: self.semitone_range.min,
                max: self.semitone_range.max,
            });
        }
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        if sample_rate == 0 {
            return Err(AugmentError::InvalidSampleRate { sample_rate });
        }
        let semitones = self.semitone_range.sample(rng);
        let channels = waveform
            .channels()
            .map(|ch| shift_channel(ch, semitones, sample_rate))
            .collect::<Result<Vec<_>>>()?;
        Waveform::from_channels(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spectral::power_spectrum;
    use crate::engine::Seed;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    fn peak_bin(signal: &[f32]) -> usize {
        let psd = power_spectrum(signal);
        psd.iter()
            .enumerate()
            .skip(1)
            .fold((0, 0.0_f32), |best, (k, &p)| if p > best.1 { (k, p) } else { best })
            .0
    }

    #[test]
    fn test_shape_preserved() {
        let mut rng = Seed::new(1).to_rng();
        let input = Waveform::broadcast(&sine(440.0, 16000, 4000), 2);
        let out = PitchShift::default().apply(&input, 16000, &mut rng).unwrap();
        assert_eq!(out.shape(), input.shape());
        assert!(out.is_finite());
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let mut rng = Seed::new(2).to_rng();
        let sr = 16000;
        let len = 8192;
        let input = Waveform::mono(sine(500.0, sr, len));
        let out = PitchShift::fixed(12.0).apply(&input, sr, &mut rng).unwrap();

        let before = peak_bin(input.channel(0));
        let after = peak_bin(out.channel(0));
        let ratio = after as f32 / before as f32;
        assert!((ratio - 2.0).abs() < 0.1, "peak moved {} -> {}", before, after);
    }

    #[test]
    fn test_zero_sample_rate_is_error() {
        let mut rng = Seed::new(3).to_rng();
        let input = Waveform::mono(sine(440.0, 16000, 1000));
        let err = PitchShift::default().apply(&input, 0, &mut rng).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
    }

    #[test]
    fn test_tiny_sample_rate_is_error() {
        // At 1 Hz a -18 semitone shift rounds the source rate down to zero
        let mut rng = Seed::new(5).to_rng();
        let input = Waveform::mono(sine(0.1, 1, 1000));
        let err = PitchShift::fixed(-18.0).apply(&input, 1, &mut rng).unwrap_err();
        assert_eq!(err.error_code(), "NUMERICAL_FAILURE");
    }

    #[test]
    fn test_too_short_is_error() {
        let mut rng = Seed::new(4).to_rng();
        let err = PitchShift::default()
            .apply(&Waveform::mono(vec![0.1; 8]), 16000, &mut rng)
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
