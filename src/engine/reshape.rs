//! Shape and channel reconciliation
//!
//! Rules shared by every transform that has to bring a buffer back to a
//! target shape:
//! - longer than the target: trim (at a random offset for mix samples,
//!   from the front otherwise)
//! - shorter than the target: zero-pad the trailing edge
//! - channel mismatch: broadcast a single channel, or average several
//!   channels into one and broadcast that

use rand::Rng;

use crate::engine::buffer::Waveform;
use crate::engine::rng::randint;
use crate::error::{AugmentError, Result};

/// Truncate or zero-pad one channel to exactly `target` samples
pub fn fit_length(channel: &[f32], target: usize) -> Vec<f32> {
    let mut out: Vec<f32> = channel.iter().copied().take(target).collect();
    out.resize(target, 0.0);
    out
}

/// Truncate or zero-pad every channel to exactly `target` samples
pub fn force_length(waveform: Waveform, target: usize) -> Waveform {
    if waveform.num_samples() == target {
        return waveform;
    }
    let channels = waveform
        .into_channels()
        .into_iter()
        .map(|ch| fit_length(&ch, target))
        .collect();
    // Every channel now has `target` samples
    Waveform::from_channels(channels).unwrap_or_default()
}

/// Bring a waveform to `target` samples, cutting a random window out of
/// longer inputs and zero-padding shorter ones
pub fn match_length<R: Rng + ?Sized>(sample: &Waveform, target: usize, rng: &mut R) -> Waveform {
    let len = sample.num_samples();
    if len > target {
        let start = randint(rng, 0, len - target);
        let channels = sample
            .channels()
            .map(|ch| ch[start..start + target].to_vec())
            .collect();
        Waveform::from_channels(channels).unwrap_or_default()
    } else {
        force_length(sample.clone(), target)
    }
}

/// Bring a waveform to `target` channels
///
/// # Errors
/// `EmptyMixSample` if the input has no channels to broadcast from
pub fn match_channels(sample: Waveform, target: usize) -> Result<Waveform> {
    let channels = sample.num_channels();
    if channels == target {
        return Ok(sample);
    }
    if channels == 0 {
        return Err(AugmentError::EmptyMixSample);
    }
    if channels == 1 {
        return Ok(Waveform::broadcast(sample.channel(0), target));
    }

    let len = sample.num_samples();
    let mut mean = vec![0.0_f32; len];
    for ch in sample.channels() {
        for (m, &s) in mean.iter_mut().zip(ch.iter()) {
            *m += s;
        }
    }
    let scale = 1.0 / channels as f32;
    for m in &mut mean {
        *m *= scale;
    }
    Ok(Waveform::broadcast(&mean, target))
}

/// Reconcile `sample` to the `(channels, samples)` shape of a target
pub fn reconcile<R: Rng + ?Sized>(
    sample: &Waveform,
    target: (usize, usize),
    rng: &mut R,
) -> Result<Waveform> {
    if sample.shape() == target {
        return Ok(sample.clone());
    }
    let (target_channels, target_len) = target;
    let resized = match_length(sample, target_len, rng);
    match_channels(resized, target_channels)
}
