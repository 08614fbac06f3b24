//! Spectral primitives
//!
//! STFT/ISTFT, whole-signal FFT filtering, FFT convolution, phase vocoder
//! and linear resampling. Everything here is deterministic; transforms
//! draw their random parameters before calling in.

use std::f32::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{AugmentError, Result};

/// Periodic Hann window of length `size`
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Signed normalized frequency of FFT bin `k` in an `n`-point transform
///
/// Bins `0..=(n-1)/2` are non-negative, the rest wrap to negative
/// frequencies, in cycles per sample.
#[inline]
pub fn fft_frequency(k: usize, n: usize) -> f32 {
    if k <= (n - 1) / 2 {
        k as f32 / n as f32
    } else {
        (k as f32 - n as f32) / n as f32
    }
}

// ============================================================================
// Spectrogram
// ============================================================================

/// One-sided complex spectrogram, indexed `[frame][bin]`
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: Vec<Vec<Complex<f32>>>,
    num_bins: usize,
}

impl Spectrogram {
    pub fn new(frames: Vec<Vec<Complex<f32>>>, num_bins: usize) -> Self {
        Self { frames, num_bins }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn frames(&self) -> &[Vec<Complex<f32>>] {
        &self.frames
    }

    /// Zero bins `start..start + width` (clipped) across all frames
    pub fn zero_bins(&mut self, start: usize, width: usize) {
        let end = (start + width).min(self.num_bins);
        if start >= end {
            return;
        }
        for frame in &mut self.frames {
            for bin in &mut frame[start..end] {
                *bin = Complex::new(0.0, 0.0);
            }
        }
    }

    /// Magnitude of every bin
    pub fn magnitudes(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

// ============================================================================
// STFT
// ============================================================================

/// Short-time Fourier transform with a Hann window and centered reflect
/// padding of `n_fft / 2` on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stft {
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Stft {
    pub const fn new(n_fft: usize, hop_length: usize) -> Self {
        Self { n_fft, hop_length }
    }

    /// Number of one-sided frequency bins
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Shortest signal the reflect padding can handle
    pub fn min_length(&self) -> usize {
        self.n_fft / 2 + 1
    }

    fn check(&self) -> Result<()> {
        if self.n_fft < 2 || self.hop_length == 0 || self.hop_length > self.n_fft {
            return Err(AugmentError::invalid_parameter(
                "stft",
                format!("n_fft={}, hop={}", self.n_fft, self.hop_length),
                "n_fft >= 2 and 0 < hop <= n_fft",
            ));
        }
        Ok(())
    }

    /// Analyze a single channel
    ///
    /// # Errors
    /// `BufferTooShort` when the signal is not longer than `n_fft / 2`
    pub fn forward(&self, signal: &[f32]) -> Result<Spectrogram> {
        self.check()?;
        let pad = self.n_fft / 2;
        if signal.len() <= pad {
            return Err(AugmentError::BufferTooShort {
                transform: "stft".to_string(),
                required: self.min_length(),
                actual: signal.len(),
            });
        }

        let padded = reflect_pad(signal, pad);
        let num_frames = 1 + (padded.len() - self.n_fft) / self.hop_length;
        let window = hann_window(self.n_fft);
        let num_bins = self.num_bins();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.n_fft);

        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * window[i], 0.0);
            }
            fft.process(&mut buffer);
            frames.push(buffer[..num_bins].to_vec());
        }

        Ok(Spectrogram::new(frames, num_bins))
    }

    /// Overlap-add resynthesis, trimmed or zero-padded to `length` samples
    pub fn inverse(&self, spec: &Spectrogram, length: usize) -> Result<Vec<f32>> {
        self.check()?;
        if spec.num_bins() != self.num_bins() {
            return Err(AugmentError::invalid_parameter(
                "spectrogram bins",
                spec.num_bins(),
                format!("{} bins", self.num_bins()),
            ));
        }
        if spec.num_frames() == 0 {
            return Ok(vec![0.0; length]);
        }

        let n = self.n_fft;
        let window = hann_window(n);
        let total = n + self.hop_length * (spec.num_frames() - 1);
        let mut output = vec![0.0_f32; total];
        let mut window_sum = vec![0.0_f32; total];

        let mut planner = FftPlanner::<f32>::new();
        let ifft = planner.plan_fft_inverse(n);
        let scale = 1.0 / n as f32;

        let mut buffer = vec![Complex::new(0.0, 0.0); n];
        for (frame_idx, frame) in spec.frames().iter().enumerate() {
            // Rebuild the Hermitian-symmetric full spectrum
            for k in 0..n {
                buffer[k] = if k < frame.len() {
                    frame[k]
                } else {
                    frame[n - k].conj()
                };
            }
            ifft.process(&mut buffer);

            let start = frame_idx * self.hop_length;
            for i in 0..n {
                output[start + i] += buffer[i].re * scale * window[i];
                window_sum[start + i] += window[i] * window[i];
            }
        }

        for (sample, &norm) in output.iter_mut().zip(window_sum.iter()) {
            if norm > 1e-11 {
                *sample /= norm;
            }
        }

        let pad = n / 2;
        let mut result: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
        result.resize(length, 0.0);
        Ok(result)
    }
}

/// Mirror `pad` samples onto both ends, excluding the edge sample itself
fn reflect_pad(signal: &[f32], pad: usize) -> Vec<f32> {
    let mut padded = Vec::with_capacity(signal.len() + 2 * pad);
    padded.extend((1..=pad).rev().map(|i| signal[i]));
    padded.extend_from_slice(signal);
    let last = signal.len() - 1;
    padded.extend((1..=pad).map(|i| signal[last - i]));
    padded
}

// ============================================================================
// Frame interpolation / phase vocoder
// ============================================================================

/// Fractional frame positions `0, rate, 2 * rate, ...` below `num_frames`
fn time_steps(num_frames: usize, rate: f32) -> Vec<f32> {
    let mut steps = Vec::new();
    let mut t = 0.0_f32;
    let mut i = 0usize;
    while t < num_frames as f32 {
        steps.push(t);
        i += 1;
        t = i as f32 * rate;
    }
    steps
}

fn check_rate(rate: f32) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(AugmentError::numerical(format!(
            "stretch rate must be positive and finite, got {rate}"
        )));
    }
    Ok(())
}

/// Time-stretch a magnitude spectrogram by linear interpolation between
/// neighbouring frames. `rate > 1` shortens, `rate < 1` lengthens.
pub fn stretch_magnitudes(magnitudes: &[Vec<f32>], rate: f32) -> Result<Vec<Vec<f32>>> {
    check_rate(rate)?;
    let Some(num_bins) = magnitudes.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    let zeros = vec![0.0_f32; num_bins];
    let frame_at = |idx: usize| magnitudes.get(idx).unwrap_or(&zeros);

    Ok(time_steps(magnitudes.len(), rate)
        .into_iter()
        .map(|t| {
            let idx = t.floor() as usize;
            let alpha = t - idx as f32;
            frame_at(idx)
                .iter()
                .zip(frame_at(idx + 1).iter())
                .map(|(&m0, &m1)| (1.0 - alpha) * m0 + alpha * m1)
                .collect()
        })
        .collect())
}

/// Phase vocoder time stretch of a complex spectrogram
///
/// Magnitudes are interpolated between neighbouring frames while phases
/// are accumulated from the per-bin instantaneous frequency, so tonal
/// content keeps its pitch.
pub fn phase_vocoder(spec: &Spectrogram, rate: f32, hop_length: usize) -> Result<Spectrogram> {
    check_rate(rate)?;
    let num_bins = spec.num_bins();
    if spec.num_frames() == 0 || num_bins < 2 {
        return Ok(spec.clone());
    }

    let phase_advance: Vec<f32> = (0..num_bins)
        .map(|k| PI * hop_length as f32 * k as f32 / (num_bins - 1) as f32)
        .collect();

    let zeros = vec![Complex::new(0.0_f32, 0.0); num_bins];
    let frames = spec.frames();
    let frame_at = |idx: usize| frames.get(idx).unwrap_or(&zeros);

    let mut phase_acc: Vec<f32> = frames[0].iter().map(|c| c.arg()).collect();
    let steps = time_steps(spec.num_frames(), rate);
    let mut out = Vec::with_capacity(steps.len());

    for t in steps {
        let idx = t.floor() as usize;
        let alpha = t - idx as f32;
        let s0 = frame_at(idx);
        let s1 = frame_at(idx + 1);

        let mut frame = Vec::with_capacity(num_bins);
        for k in 0..num_bins {
            let mag = (1.0 - alpha) * s0[k].norm() + alpha * s1[k].norm();
            frame.push(Complex::from_polar(mag, phase_acc[k]));

            let mut delta = s1[k].arg() - s0[k].arg() - phase_advance[k];
            delta -= 2.0 * PI * (delta / (2.0 * PI)).round();
            phase_acc[k] += delta + phase_advance[k];
        }
        out.push(frame);
    }

    Ok(Spectrogram::new(out, num_bins))
}

// ============================================================================
// Whole-signal FFT helpers
// ============================================================================

/// Filter a signal in the frequency domain
///
/// Each FFT bin is multiplied by `response(|f|)` where `f` is the bin's
/// signed normalized frequency; the real part of the inverse is returned.
pub fn fft_filter<F>(signal: &[f32], response: F) -> Vec<f32>
where
    F: Fn(f32) -> f32,
{
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buffer);
    for (k, bin) in buffer.iter_mut().enumerate() {
        *bin *= response(fft_frequency(k, n).abs());
    }
    ifft.process(&mut buffer);

    let scale = 1.0 / n as f32;
    buffer.into_iter().map(|c| c.re * scale).collect()
}

/// Power spectrum `|X[k]|^2` of the positive-frequency bins `0..=n/2`
pub fn power_spectrum(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buffer);
    buffer[..=n / 2].iter().map(|c| c.norm_sqr()).collect()
}

/// Full linear convolution (`len = signal + kernel - 1`) via FFT
pub fn fft_convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let full_len = signal.len() + kernel.len() - 1;
    let n = full_len.next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let to_padded = |data: &[f32]| {
        let mut buf = vec![Complex::new(0.0_f32, 0.0); n];
        for (slot, &v) in buf.iter_mut().zip(data.iter()) {
            *slot = Complex::new(v, 0.0);
        }
        buf
    };

    let mut a = to_padded(signal);
    let mut b = to_padded(kernel);
    fft.process(&mut a);
    fft.process(&mut b);
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x *= *y;
    }
    ifft.process(&mut a);

    let scale = 1.0 / n as f32;
    a.into_iter().take(full_len).map(|c| c.re * scale).collect()
}

/// Largest up- or down-sampling factor `resample_linear` accepts
pub const MAX_RESAMPLE_RATIO: f64 = 1024.0;

/// Resample by linear interpolation to `round(len * ratio)` samples
///
/// # Errors
/// `NumericalFailure` if `ratio` is not finite or lies outside
/// `[1 / MAX_RESAMPLE_RATIO, MAX_RESAMPLE_RATIO]`
pub fn resample_linear(samples: &[f32], ratio: f64) -> Result<Vec<f32>> {
    if !ratio.is_finite() || !(1.0 / MAX_RESAMPLE_RATIO..=MAX_RESAMPLE_RATIO).contains(&ratio) {
        return Err(AugmentError::numerical(format!(
            "resample ratio {} out of range",
            ratio
        )));
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    let new_len = ((samples.len() as f64) * ratio).round().max(1.0) as usize;
    let step = 1.0 / ratio;
    let last = samples.len() - 1;

    Ok((0..new_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos.floor() as usize).min(last);
            let frac = (pos - idx as f64).clamp(0.0, 1.0) as f32;
            let a = samples[idx];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect())
}
