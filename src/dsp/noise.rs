//! Additive noise
//!
//! Adds white, pink or brown noise at a randomly drawn level. Colored noise
//! is white noise shaped in the frequency domain:
//! - pink: amplitude `1/sqrt(|f| + eps)` (power falls 3 dB per octave)
//! - brown: amplitude `1/(|f| + eps)` (power falls 6 dB per octave)
//!
//! `eps` is one frequency bin (`1/n`), which keeps the DC term on the same
//! scale as the lowest bin. Colored noise is normalized to unit RMS so the
//! drawn level means the same thing for every color.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::rng::normal_vec;
use crate::engine::spectral::fft_filter;
use crate::engine::{ParamRange, Waveform};
use crate::error::Result;

/// Spectral color of the added noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseColor {
    #[default]
    #[serde(alias = "gaussian")]
    White,
    Pink,
    Brown,
}

impl NoiseColor {
    /// Generate one channel of unit-scale noise
    pub fn generate<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<f32> {
        let white = normal_vec(rng, len);
        if len == 0 {
            return white;
        }
        let eps = 1.0 / len as f32;
        let shaped = match self {
            NoiseColor::White => return white,
            NoiseColor::Pink => fft_filter(&white, |f| 1.0 / (f + eps).sqrt()),
            NoiseColor::Brown => fft_filter(&white, |f| 1.0 / (f + eps)),
        };
        normalize_rms(shaped)
    }
}

impl std::str::FromStr for NoiseColor {
    type Err = crate::error::AugmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "gaussian" => Ok(NoiseColor::White),
            "pink" => Ok(NoiseColor::Pink),
            "brown" => Ok(NoiseColor::Brown),
            other => Err(crate::error::AugmentError::invalid_parameter(
                "noise color",
                other,
                "white, gaussian, pink or brown",
            )),
        }
    }
}

fn normalize_rms(mut samples: Vec<f32>) -> Vec<f32> {
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len().max(1) as f32;
    let rms = mean_sq.sqrt();
    if rms > 0.0 && rms.is_finite() {
        for s in &mut samples {
            *s /= rms;
        }
    }
    samples
}

// ============================================================================
// AddNoise
// ============================================================================

/// Additive noise at a random level
///
/// # Parameters
/// - `noise_level_range`: Interval the noise scale is drawn from
///   (default 0.001 to 0.01)
/// - `color`: white (alias `gaussian`), pink or brown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddNoise {
    pub noise_level_range: ParamRange,
    pub color: NoiseColor,
}

impl Default for AddNoise {
    fn default() -> Self {
        Self {
            noise_level_range: ParamRange::new(0.001, 0.01),
            color: NoiseColor::White,
        }
    }
}

impl AddNoise {
    pub fn new(noise_level_range: ParamRange, color: NoiseColor) -> Self {
        Self {
            noise_level_range,
            color,
        }
    }
}

impl Augment for AddNoise {
    const KIND: TransformKind = TransformKind::Noise;
    const DEFAULT_PROBABILITY: f32 = 0.2;

    fn validate(&self) -> Result<()> {
        self.noise_level_range
            .validate_above("noise_level_range", 0.0, true)
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let level = self.noise_level_range.sample(rng);
        let len = waveform.num_samples();
        let mut output = waveform.clone();
        for channel in output.channels_mut() {
            let noise = self.color.generate(len, rng);
            for (s, n) in channel.iter_mut().zip(noise) {
                *s += level * n;
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spectral::power_spectrum;
    use crate::engine::{calculate_rms, Seed};
    use std::str::FromStr;

    /// Mean power of bins in each octave band `[2^k, 2^(k+1))`
    fn octave_bands(color: NoiseColor, len: usize, trials: usize) -> Vec<f32> {
        let mut rng = Seed::new(99).to_rng();
        let bands: Vec<(usize, usize)> = (3..10).map(|k| (1 << k, 1 << (k + 1))).collect();
        let mut totals = vec![0.0_f32; bands.len()];
        for _ in 0..trials {
            let noise = color.generate(len, &mut rng);
            let psd = power_spectrum(&noise);
            for (total, &(lo, hi)) in totals.iter_mut().zip(bands.iter()) {
                *total += psd[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
            }
        }
        totals
    }

    #[test]
    fn test_pink_and_brown_power_decreases_with_frequency() {
        let pink = octave_bands(NoiseColor::Pink, 4096, 16);
        let brown = octave_bands(NoiseColor::Brown, 4096, 16);
        for bands in [&pink, &brown] {
            for pair in bands.windows(2) {
                assert!(pair[1] < pair[0], "bands not decreasing: {:?}", bands);
            }
        }
        let pink_tilt = pink[0] / pink[pink.len() - 1];
        let brown_tilt = brown[0] / brown[brown.len() - 1];
        assert!(brown_tilt > pink_tilt);
    }

    #[test]
    fn test_white_noise_is_flat() {
        let white = octave_bands(NoiseColor::White, 4096, 16);
        let tilt = white[0] / white[white.len() - 1];
        assert!(tilt > 0.5 && tilt < 2.0, "tilt {}", tilt);
    }

    #[test]
    fn test_colored_noise_unit_rms() {
        let mut rng = Seed::new(5).to_rng();
        for color in [NoiseColor::Pink, NoiseColor::Brown] {
            let noise = color.generate(2048, &mut rng);
            let rms = calculate_rms(&Waveform::mono(noise));
            assert!(rms.abs() < 0.01, "rms {} dB", rms);
        }
    }

    #[test]
    fn test_noise_level_bounds_difference() {
        let mut rng = Seed::new(6).to_rng();
        let input = Waveform::from_channels(vec![vec![0.0; 1000], vec![0.5; 1000]]).unwrap();
        let noise = AddNoise::new(ParamRange::fixed(0.01), NoiseColor::White);
        let out = noise.apply(&input, 16000, &mut rng).unwrap();
        assert_eq!(out.shape(), input.shape());
        assert_ne!(out, input);
        for (o, i) in out.iter_samples().zip(input.iter_samples()) {
            // Box-Muller draws stay within about 6 sigma for f32 inputs
            assert!((o - i).abs() < 0.01 * 7.0);
        }
    }

    #[test]
    fn test_gaussian_alias() {
        let color: NoiseColor = serde_json::from_str("\"gaussian\"").unwrap();
        assert_eq!(color, NoiseColor::White);
        assert_eq!(NoiseColor::from_str("Gaussian").unwrap(), NoiseColor::White);
        assert!(NoiseColor::from_str("violet").is_err());
    }

    #[test]
    fn test_negative_level_rejected() {
        let noise = AddNoise::new(ParamRange::new(-0.1, 0.1), NoiseColor::White);
        assert!(noise.validate().is_err());
    }
}
