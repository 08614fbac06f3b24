//! Frequency and time masking
//!
//! SpecAugment-style masking applied to raw waveforms.
//! - `FrequencyMasking` zeroes bands of STFT bins and resynthesizes.
//! - `TimeMasking` zeroes a contiguous run of samples on every channel.

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::rng::randint;
use crate::engine::{Stft, Waveform};
use crate::error::{AugmentError, Result};

const FREQ_STFT: Stft = Stft::new(1024, 256);

// ============================================================================
// Frequency masking
// ============================================================================

/// Random frequency-band masking
///
/// # Parameters
/// - `freq_mask_param`: Maximum mask width in bins (default 80)
/// - `num_masks`: Masks drawn per channel (default 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyMasking {
    pub freq_mask_param: usize,
    pub num_masks: usize,
}

impl Default for FrequencyMasking {
    fn default() -> Self {
        Self {
            freq_mask_param: 80,
            num_masks: 1,
        }
    }
}

impl FrequencyMasking {
    pub fn new(freq_mask_param: usize, num_masks: usize) -> Self {
        Self {
            freq_mask_param,
            num_masks,
        }
    }

    /// Draw `(start, width)` of one mask over `num_bins` bins
    pub fn draw_band<R: Rng + ?Sized>(&self, num_bins: usize, rng: &mut R) -> (usize, usize) {
        let width = randint(rng, 0, self.freq_mask_param);
        let start = randint(rng, 0, num_bins.saturating_sub(width).max(1));
        (start, width)
    }

    fn mask_channel<R: Rng + ?Sized>(&self, channel: &[f32], rng: &mut R) -> Result<Vec<f32>> {
        let mut spec = FREQ_STFT.forward(channel)?;
        let num_bins = spec.num_bins();
        for _ in 0..self.num_masks {
            let (start, width) = self.draw_band(num_bins, rng);
            spec.zero_bins(start, width);
        }
        FREQ_STFT.inverse(&spec, channel.len())
    }
}

impl Augment for FrequencyMasking {
    const KIND: TransformKind = TransformKind::FreqMask;
    const DEFAULT_PROBABILITY: f32 = 0.3;

    fn validate(&self) -> Result<()> {
        if self.freq_mask_param > FREQ_STFT.num_bins() {
            return Err(AugmentError::invalid_parameter(
                "freq_mask_param",
                self.freq_mask_param,
                format!("at most {} bins", FREQ_STFT.num_bins()),
            ));
        }
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let channels = waveform
            .channels()
            .map(|ch| self.mask_channel(ch, rng))
            .collect::<Result<Vec<_>>>()?;
        Waveform::from_channels(channels)
    }
}

// ============================================================================
// Time masking
// ============================================================================

/// Random time-region masking
///
/// # Parameters
/// - `time_mask_param`: Maximum mask width in samples (default 100)
/// - `num_masks`: Regions zeroed per invocation (default 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeMasking {
    pub time_mask_param: usize,
    pub num_masks: usize,
}

impl Default for TimeMasking {
    fn default() -> Self {
        Self {
            time_mask_param: 100,
            num_masks: 1,
        }
    }
}

impl TimeMasking {
    pub fn new(time_mask_param: usize, num_masks: usize) -> Self {
        Self {
            time_mask_param,
            num_masks,
        }
    }

    /// Draw one masked region over `num_samples` samples
    ///
    /// The width is uniform in `[0, time_mask_param]` and the start uniform
    /// in `[0, max(1, num_samples - width)]`; the region is clipped to the
    /// buffer.
    pub fn draw_region<R: Rng + ?Sized>(&self, num_samples: usize, rng: &mut R) -> Range<usize> {
        let width = randint(rng, 0, self.time_mask_param);
        let start = randint(rng, 0, num_samples.saturating_sub(width).max(1));
        let end = (start + width).min(num_samples);
        start.min(num_samples)..end
    }
}

impl Augment for TimeMasking {
    const KIND: TransformKind = TransformKind::TimeMask;
    const DEFAULT_PROBABILITY: f32 = 0.2;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let num_samples = waveform.num_samples();
        let mut output = waveform.clone();
        for _ in 0..self.num_masks {
            let region = self.draw_region(num_samples, rng);
            for channel in output.channels_mut() {
                channel[region.clone()].fill(0.0);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spectral::power_spectrum;
    use crate::engine::Seed;

    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = Seed::new(seed).to_rng();
        (0..len).map(|_| rng.random_range(-0.5..0.5)).collect()
    }

    #[test]
    fn test_time_mask_zeroes_drawn_region_only() {
        let masking = TimeMasking::new(100, 1);
        let input = Waveform::from_channels(vec![noise(1000, 1), noise(1000, 2)]).unwrap();

        for seed in 0..50 {
            let mut rng = Seed::new(seed).to_rng();
            let mut replay = rng.clone();
            let out = masking.apply(&input, 16000, &mut rng).unwrap();
            let region = masking.draw_region(1000, &mut replay);

            for (out_ch, in_ch) in out.channels().zip(input.channels()) {
                for i in 0..1000 {
                    if region.contains(&i) {
                        assert_eq!(out_ch[i], 0.0);
                    } else {
                        assert_eq!(out_ch[i].to_bits(), in_ch[i].to_bits());
                    }
                }
            }
        }
    }

    #[test]
    fn test_time_mask_clips_wide_region() {
        let masking = TimeMasking::new(500, 1);
        let mut rng = Seed::new(3).to_rng();
        for _ in 0..100 {
            let region = masking.draw_region(50, &mut rng);
            assert!(region.end <= 50);
            assert!(region.start <= region.end);
        }
    }

    #[test]
    fn test_time_mask_empty_buffer() {
        let mut rng = Seed::new(4).to_rng();
        let out = TimeMasking::default()
            .apply(&Waveform::silence(2, 0), 16000, &mut rng)
            .unwrap();
        assert_eq!(out.shape(), (2, 0));
    }

    #[test]
    fn test_freq_mask_band_draws() {
        let masking = FrequencyMasking::default();
        let mut rng = Seed::new(5).to_rng();
        for _ in 0..200 {
            let (start, width) = masking.draw_band(513, &mut rng);
            assert!(width <= 80);
            assert!(start <= 513 - width);
        }
    }

    #[test]
    fn test_freq_mask_removes_band_energy() {
        let masking = FrequencyMasking::new(120, 1);
        let len = 8192;
        let input = Waveform::mono(noise(len, 6));
        let psd_in = power_spectrum(input.channel(0));
        // 1024-point STFT bin k maps to whole-signal bin k * len / 1024
        let scale = len / 1024;

        let mut checked = 0;
        for seed in 0..30 {
            let mut rng = Seed::new(seed).to_rng();
            let mut replay = rng.clone();
            let (start, width) = masking.draw_band(513, &mut replay);
            let out = masking.apply(&input, 16000, &mut rng).unwrap();
            assert_eq!(out.shape(), input.shape());

            let end = (start + width).min(512);
            if end < start + 30 {
                continue;
            }
            let band = (start + 4) * scale..(end - 4) * scale;
            let psd_out = power_spectrum(out.channel(0));
            let before: f32 = psd_in[band.clone()].iter().sum();
            let after: f32 = psd_out[band].iter().sum();
            assert!(after < 0.1 * before, "band kept {} of {}", after, before);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_zero_width_mask_reconstructs_input() {
        let masking = FrequencyMasking::new(0, 1);
        let input = Waveform::mono(noise(4096, 7));
        let mut rng = Seed::new(7).to_rng();
        let out = masking.apply(&input, 16000, &mut rng).unwrap();
        for (o, i) in out.iter_samples().zip(input.iter_samples()) {
            assert!((o - i).abs() < 1e-3);
        }
    }

    #[test]
    fn test_freq_mask_short_buffer() {
        let mut rng = Seed::new(8).to_rng();
        let err = FrequencyMasking::default()
            .apply(&Waveform::mono(vec![0.0; 300]), 16000, &mut rng)
            .unwrap_err();
        assert_eq!(err.error_code(), "BUFFER_TOO_SHORT");
    }

    #[test]
    fn test_freq_mask_param_bound() {
        assert!(FrequencyMasking::new(600, 1).validate().is_err());
        assert!(FrequencyMasking::default().validate().is_ok());
    }
}
