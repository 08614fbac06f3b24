//! Convolution reverb with a synthetic impulse response
//!
//! Each invocation builds a fresh impulse response:
//! - length `sample_rate * room_size * 0.5` samples
//! - Gaussian noise shaped by `exp(-damping * t / len)`
//! - normalized to unit peak
//!
//! The response is convolved with every channel, the result is centered on
//! the input timeline, and 30% wet is mixed with 70% dry.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::rng::normal_vec;
use crate::engine::spectral::fft_convolve;
use crate::engine::{ParamRange, Waveform};
use crate::error::{AugmentError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Wet share of the output
const WET_MIX: f32 = 0.3;

/// Impulse response length in seconds per unit of room size
const SECONDS_PER_ROOM: f32 = 0.5;

// ============================================================================
// Reverb
// ============================================================================

/// Synthetic convolution reverb
///
/// # Parameters
/// - `room_size_range`: Drawn room size, sets the response length
///   (default 0.1 to 0.9)
/// - `damping_range`: Drawn decay rate of the response envelope
///   (default 0.1 to 0.9)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reverb {
    pub room_size_range: ParamRange,
    pub damping_range: ParamRange,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            room_size_range: ParamRange::new(0.1, 0.9),
            damping_range: ParamRange::new(0.1, 0.9),
        }
    }
}

impl Reverb {
    pub fn new(room_size_range: ParamRange, damping_range: ParamRange) -> Self {
        Self {
            room_size_range,
            damping_range,
        }
    }
}

/// Build a peak-normalized, exponentially decaying noise response
///
/// # Errors
/// `NumericalFailure` if the response is empty or all zeros
pub fn impulse_response<R: Rng + ?Sized>(len: usize, damping: f32, rng: &mut R) -> Result<Vec<f32>> {
    if len == 0 {
        return Err(AugmentError::numerical("impulse response has zero length"));
    }
    let mut ir = normal_vec(rng, len);
    for (t, s) in ir.iter_mut().enumerate() {
        *s *= (-damping * t as f32 / len as f32).exp();
    }
    let peak = ir.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    if !(peak > 0.0) || !peak.is_finite() {
        return Err(AugmentError::numerical("impulse response has no energy"));
    }
    for s in &mut ir {
        *s /= peak;
    }
    Ok(ir)
}

impl Augment for Reverb {
    const KIND: TransformKind = TransformKind::Reverb;
    const DEFAULT_PROBABILITY: f32 = 0.25;

    fn validate(&self) -> Result<()> {
        self.room_size_range
            .validate_above("room_size_range", 0.0, false)?;
        self.damping_range.validate_above("damping_range", 0.0, true)
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
        let room_size = self.room_size_range.sample(rng);
        let damping = self.damping_range.sample(rng);

        let ir_len = (sample_rate as f32 * room_size * SECONDS_PER_ROOM) as usize;
        let ir = impulse_response(ir_len, damping, rng)?;
        let offset = ir_len / 2;

        let mut output = waveform.clone();
        for channel in output.channels_mut() {
            let wet = fft_convolve(channel, &ir);
            for (i, s) in channel.iter_mut().enumerate() {
                let w = wet.get(i + offset).copied().unwrap_or(0.0);
                *s = (1.0 - WET_MIX) * *s + WET_MIX * w;
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
    fn test_impulse_response_shape() {
        let mut rng = Seed::new(1).to_rng();
        let ir = impulse_response(4000, 0.5, &mut rng).unwrap();
        assert_eq!(ir.len(), 4000);
        let peak = ir.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert_relative_eq!(peak, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_impulse_response_is_error() {
        let mut rng = Seed::new(2).to_rng();
        assert!(impulse_response(0, 0.5, &mut rng).is_err());
    }

    #[test]
    fn test_preserves_shape_and_mixes_dry() {
        let mut rng = Seed::new(3).to_rng();
        let mut input = Waveform::silence(2, 2000);
        input.channel_mut(0)[1000] = 1.0;
        input.channel_mut(1)[500] = -1.0;

        let out = Reverb::default().apply(&input, 8000, &mut rng).unwrap();
        assert_eq!(out.shape(), input.shape());
        assert!(out.is_finite());
        // Impulse spreads energy around the original position
        let spread = out.channel(0).iter().filter(|s| s.abs() > 1e-6).count();
        assert!(spread > 100);
    }

    #[test]
    fn test_tiny_room_at_low_rate_is_error() {
        // 1 Hz * 0.1 * 0.5 truncates to a zero-length response
        let mut rng = Seed::new(4).to_rng();
        let reverb = Reverb::new(ParamRange::fixed(0.1), ParamRange::fixed(0.5));
        let err = reverb
            .apply(&Waveform::mono(vec![0.5; 64]), 1, &mut rng)
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_zero_sample_rate_is_error() {
        let mut rng = Seed::new(5).to_rng();
        let err = Reverb::default()
            .apply(&Waveform::mono(vec![0.5; 64]), 0, &mut rng)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");
    }

    #[test]
    fn test_validate_rejects_zero_room() {
        let reverb = Reverb::new(ParamRange::new(0.0, 0.5), ParamRange::new(0.1, 0.9));
        assert!(reverb.validate().is_err());
    }
}
