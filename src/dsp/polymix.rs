//! Polyphonic mixing
//!
//! Blends the target with randomly chosen samples from a pool of other
//! waveforms. Each pool sample is reconciled to the target's shape first
//! (random-window trim or zero-pad, then channel broadcast or averaging).
//!
//! The pool is runtime state: it is not serialized, and a pipeline can
//! share one pool across all its mix transforms.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::reshape::reconcile;
use crate::engine::rng::randint;
use crate::engine::{ParamRange, Waveform};
use crate::error::{AugmentError, Result};

/// Shared, read-only set of waveforms to mix in
pub type MixPool = Arc<Vec<Waveform>>;

/// Random blend with pool samples
///
/// # Parameters
/// - `mix_ratio_range`: Weight of the pool sample in each blend
///   (default 0.1 to 0.5)
/// - `num_mix`: Blends per invocation, capped by the pool size (default 2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polymix {
    pub mix_ratio_range: ParamRange,
    pub num_mix: usize,
    #[serde(skip)]
    pool: MixPool,
}

impl Default for Polymix {
    fn default() -> Self {
        Self {
            mix_ratio_range: ParamRange::new(0.1, 0.5),
            num_mix: 2,
            pool: MixPool::default(),
        }
    }
}

impl Polymix {
    pub fn new(mix_ratio_range: ParamRange, num_mix: usize) -> Self {
        Self {
            mix_ratio_range,
            num_mix,
            pool: MixPool::default(),
        }
    }

    /// Replace the pool with `samples`
    pub fn set_mix_samples(&mut self, samples: Vec<Waveform>) {
        self.pool = Arc::new(samples);
    }

    /// Point this transform at an existing pool
    pub fn share_pool(&mut self, pool: MixPool) {
        self.pool = pool;
    }

    pub fn mix_samples(&self) -> &[Waveform] {
        &self.pool
    }
}

impl Augment for Polymix {
    const KIND: TransformKind = TransformKind::Mix;
    const DEFAULT_PROBABILITY: f32 = 0.2;

    fn validate(&self) -> Result<()> {
        self.mix_ratio_range
            .validate_above("mix_ratio_range", 0.0, true)?;
        if self.mix_ratio_range.max > 1.0 {
            return Err(AugmentError::InvalidRange {
                param: "mix_ratio_range".to_string(),
                min: self.mix_ratio_range.min,
                max: self.mix_ratio_range.max,
            });
        }
        if self.num_mix == 0 {
            return Err(AugmentError::invalid_parameter("num_mix", 0, "at least 1"));
        }
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let mut output = waveform.clone();
        if self.pool.is_empty() {
            return Ok(output);
        }

        let target = waveform.shape();
        for _ in 0..self.num_mix.min(self.pool.len()) {
            let sample = &self.pool[randint(rng, 0, self.pool.len() - 1)];
            let reconciled = reconcile(sample, target, rng)?;
            let ratio = self.mix_ratio_range.sample(rng);
            output.blend(&reconciled, ratio)?;
        }
        Ok(output)
    }
}
