//! Waveform Buffer
//!
//! Provides the multi-channel waveform type every transform consumes and
//! produces, plus level helpers used by transforms and tests.
//!
//! A waveform has shape `[channels, samples]`. Every channel holds the same
//! number of samples; constructors reject ragged input and the public API
//! never hands out a growable channel, so the invariant holds for the
//! lifetime of the value.

use crate::error::{AugmentError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (`10^(db/20)`)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of a waveform in dB
///
/// Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_rms(waveform: &Waveform) -> f32 {
    let total_samples = waveform.num_channels() * waveform.num_samples();
    if total_samples == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = waveform
        .iter_samples()
        .map(|s| (s as f64) * (s as f64))
        .sum();

    let rms = (sum_squares / total_samples as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak level of a waveform in dB
pub fn calculate_peak(waveform: &Waveform) -> f32 {
    let peak = waveform.iter_samples().map(f32::abs).fold(0.0_f32, f32::max);
    linear_to_db(peak)
}

// ============================================================================
// Waveform
// ============================================================================

/// Fixed-length multi-channel audio buffer
///
/// Stores audio as non-interleaved 32-bit floating point samples, one
/// `Vec<f32>` per channel. Sample values are nominally in `[-1, 1]` but are
/// never clamped.
///
/// # Example
/// ```
/// use waveaug::engine::Waveform;
///
/// let waveform = Waveform::silence(2, 48000);
/// assert_eq!(waveform.shape(), (2, 48000));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    samples: Vec<Vec<f32>>,
}

impl Waveform {
    /// Create a zeroed waveform with the given shape
    pub fn silence(num_channels: usize, num_samples: usize) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
        }
    }

    /// Create a waveform from per-channel sample vectors
    ///
    /// # Errors
    /// `RaggedWaveform` if the channels differ in length
    pub fn from_channels(samples: Vec<Vec<f32>>) -> Result<Self> {
        let expected = samples.first().map(Vec::len).unwrap_or(0);
        for (channel, data) in samples.iter().enumerate() {
            if data.len() != expected {
                return Err(AugmentError::RaggedWaveform {
                    channel,
                    expected,
                    found: data.len(),
                });
            }
        }
        Ok(Self { samples })
    }

    /// Create a single-channel waveform
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            samples: vec![samples],
        }
    }

    /// Create a waveform by repeating one channel `num_channels` times
    pub fn broadcast(channel: &[f32], num_channels: usize) -> Self {
        Self {
            samples: vec![channel.to_vec(); num_channels],
        }
    }

    /// Create a waveform from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `num_channels` - Number of interleaved channels
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize) -> Result<Self> {
        if num_channels == 0 {
            return Err(AugmentError::invalid_parameter(
                "num_channels",
                num_channels,
                "at least 1",
            ));
        }

        if interleaved.len() % num_channels != 0 {
            return Err(AugmentError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self { samples })
    }

    /// Convert the waveform to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.num_channels() * self.num_samples());
        for sample_idx in 0..self.num_samples() {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(Vec::len).unwrap_or(0)
    }

    /// `(channels, samples)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_channels(), self.num_samples())
    }

    /// Check if the waveform holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Duration in seconds at the given sample rate
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / sample_rate as f64
    }

    /// Immutable access to one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Iterate over channels mutably
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.samples.iter_mut().map(Vec::as_mut_slice)
    }

    /// Iterate over every sample, channel by channel
    pub fn iter_samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().flat_map(|ch| ch.iter().copied())
    }

    /// Consume the waveform, returning its channel vectors
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.samples
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.iter_samples().all(f32::is_finite)
    }

    /// Multiply every sample by `factor`
    pub fn scale(&mut self, factor: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= factor;
            }
        }
    }

    /// Linear blend: `self = (1 - ratio) * self + ratio * other`
    ///
    /// # Errors
    /// `ShapeMismatch` if the shapes differ
    pub fn blend(&mut self, other: &Waveform, ratio: f32) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(AugmentError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }

        let dry = 1.0 - ratio;
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            for (d, &s) in dst.iter_mut().zip(src.iter()) {
                *d = dry * *d + ratio * s;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_shape() {
        let waveform = Waveform::silence(2, 100);
        assert_eq!(waveform.shape(), (2, 100));
        assert!(waveform.iter_samples().all(|s| s == 0.0));
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let err = Waveform::from_channels(vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert_eq!(err.error_code(), "RAGGED_WAVEFORM");
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let waveform = Waveform::from_interleaved(&interleaved, 2).unwrap();
        assert_eq!(waveform.channel(0), &[0.1, 0.3, 0.5]);
        assert_eq!(waveform.channel(1), &[0.2, 0.4, 0.6]);
        assert_eq!(waveform.to_interleaved(), interleaved);
    }

    #[test]
    fn test_from_interleaved_bad_length() {
        assert!(Waveform::from_interleaved(&[0.0; 5], 2).is_err());
        assert!(Waveform::from_interleaved(&[0.0; 4], 0).is_err());
    }

    #[test]
    fn test_duration_secs() {
        let waveform = Waveform::silence(2, 24000);
        assert!((waveform.duration_secs(16000) - 1.5).abs() < 1e-9);
        assert_eq!(waveform.duration_secs(0), 0.0);
    }

    #[test]
    fn test_blend() {
        let mut a = Waveform::mono(vec![1.0, 1.0]);
        let b = Waveform::mono(vec![0.0, 2.0]);
        a.blend(&b, 0.25).unwrap();
        assert!((a.channel(0)[0] - 0.75).abs() < 1e-6);
        assert!((a.channel(0)[1] - 1.25).abs() < 1e-6);

        let c = Waveform::silence(2, 2);
        assert!(a.blend(&c, 0.5).is_err());
    }

    #[test]
    fn test_db_conversions() {
        assert!((db_to_linear(-6.0) - 0.501187).abs() < 0.001);
        assert!((linear_to_db(1.0)).abs() < 1e-6);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_rms_and_peak() {
        let waveform = Waveform::mono(vec![0.5, -0.5, 0.5, -0.5]);
        assert!((calculate_rms(&waveform) - linear_to_db(0.5)).abs() < 1e-4);
        assert!((calculate_peak(&waveform) - linear_to_db(0.5)).abs() < 1e-4);
        assert_eq!(calculate_rms(&Waveform::default()), f32::NEG_INFINITY);
    }
}
