//! Augmentation pipeline
//!
//! An ordered list of transforms run in one of two modes:
//! - all-gated: every transform is visited in registration order and its
//!   own probability gate decides whether it runs.
//! - bounded-random: at most `max_active` transforms are visited. A count
//!   is drawn uniformly from `1..=min(max_active, len)`, that many distinct
//!   transforms are picked uniformly at random and visited in the sampled
//!   order, each still subject to its own gate.
//!
//! Applying a pipeline never fails; each transform falls back to its input.

use std::sync::Arc;

use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::dsp::transform::{Outcome, Transform, TransformKind, TransformOp};
use crate::engine::Waveform;
use crate::error::{AugmentError, Result};

/// What one selected transform did during `Pipeline::apply_with_report`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    /// Position of the transform in the pipeline
    pub index: usize,
    pub kind: TransformKind,
    pub outcome: Outcome,
}

/// Ordered, optionally bounded set of transforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    transforms: Vec<Transform>,
    max_active: Option<usize>,
}

impl Pipeline {
    /// All-gated pipeline
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self {
            transforms,
            max_active: None,
        }
    }

    /// Bounded-random pipeline
    ///
    /// # Errors
    /// `InvalidParameter` if `max_active` is zero
    pub fn with_max_active(transforms: Vec<Transform>, max_active: usize) -> Result<Self> {
        let mut pipeline = Self::new(transforms);
        pipeline.set_max_active(Some(max_active))?;
        Ok(pipeline)
    }

    /// Bounded pipeline from known-good parts
    pub(crate) fn from_parts(transforms: Vec<Transform>, max_active: usize) -> Self {
        Self {
            transforms,
            max_active: Some(max_active.max(1)),
        }
    }

    pub fn max_active(&self) -> Option<usize> {
        self.max_active
    }

    /// Switch modes; `None` visits every transform
    pub fn set_max_active(&mut self, max_active: Option<usize>) -> Result<()> {
        if max_active == Some(0) {
            return Err(AugmentError::invalid_parameter(
                "max_active",
                0,
                "at least 1",
            ));
        }
        self.max_active = max_active;
        Ok(())
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Append a transform
    pub fn push(&mut self, transform: Transform) {
        self.transforms.push(transform);
    }

    /// Remove every transform of `kind`
    ///
    /// # Returns
    /// Number of transforms removed
    pub fn remove_kind(&mut self, kind: TransformKind) -> usize {
        let before = self.transforms.len();
        self.transforms.retain(|t| t.kind() != kind);
        before - self.transforms.len()
    }

    pub fn contains_kind(&self, kind: TransformKind) -> bool {
        self.transforms.iter().any(|t| t.kind() == kind)
    }

    /// Give every mix transform the same pool of samples
    ///
    /// # Returns
    /// Number of mix transforms updated
    pub fn set_mix_samples(&mut self, samples: Vec<Waveform>) -> usize {
        let pool = Arc::new(samples);
        let mut updated = 0;
        for transform in &mut self.transforms {
            if let TransformOp::Mix(mix) = transform.op_mut() {
                mix.share_pool(Arc::clone(&pool));
                updated += 1;
            }
        }
        debug!(pool_size = pool.len(), updated, "mix pool updated");
        updated
    }

    /// Indices of the transforms visited by one invocation, in visit order
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let n = self.transforms.len();
        match self.max_active {
            _ if n == 0 => Vec::new(),
            None => (0..n).collect(),
            Some(max_active) => {
                let count = rng.random_range(1..=max_active.min(n));
                index::sample(rng, n, count).into_vec()
            }
        }
    }

    /// Run the pipeline on a copy of `waveform`
    pub fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Waveform {
        self.apply_with_report(waveform, sample_rate, rng).0
    }

    /// Run the pipeline and report each visited transform's outcome
    pub fn apply_with_report<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> (Waveform, Vec<TransformReport>) {
        let selected = self.select(rng);
        let mut current = waveform.clone();
        let mut reports = Vec::with_capacity(selected.len());

        for index in selected {
            let transform = &self.transforms[index];
            let (next, outcome) = transform.invoke_with_outcome(current, sample_rate, rng);
            current = next;
            reports.push(TransformReport {
                index,
                kind: transform.kind(),
                outcome,
            });
        }

        debug!(
            visited = reports.len(),
            applied = reports
                .iter()
                .filter(|r| r.outcome == Outcome::Applied)
                .count(),
            "pipeline applied"
        );
        (current, reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Distortion, Gain, Polymix, TimeMasking};
    use crate::engine::Seed;
    use std::collections::HashSet;

    fn gains(n: usize) -> Vec<Transform> {
        (0..n)
            .map(|i| Transform::new(1.0, Gain::fixed(i as f32 + 1.0)).unwrap())
            .collect()
    }

    #[test]
    fn test_all_gated_visits_in_order() {
        let pipeline = Pipeline::new(gains(4));
        let mut rng = Seed::new(1).to_rng();
        let (_, reports) = pipeline.apply_with_report(&Waveform::mono(vec![0.1; 16]), 16000, &mut rng);
        let order: Vec<usize> = reports.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bounded_selection_distinct_and_capped() {
        let pipeline = Pipeline::with_max_active(gains(6), 2).unwrap();
        let mut rng = Seed::new(2).to_rng();
        let mut seen_counts = HashSet::new();
        for _ in 0..500 {
            let selected = pipeline.select(&mut rng);
            assert!((1..=2).contains(&selected.len()));
            let unique: HashSet<_> = selected.iter().collect();
            assert_eq!(unique.len(), selected.len());
            assert!(selected.iter().all(|&i| i < 6));
            seen_counts.insert(selected.len());
        }
        assert_eq!(seen_counts.len(), 2);
    }

    #[test]
    fn test_bounded_selection_caps_at_len() {
        let pipeline = Pipeline::with_max_active(gains(2), 5).unwrap();
        let mut rng = Seed::new(3).to_rng();
        for _ in 0..100 {
            assert!(pipeline.select(&mut rng).len() <= 2);
        }
    }

    #[test]
    fn test_zero_max_active_rejected() {
        assert!(Pipeline::with_max_active(gains(2), 0).is_err());
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mut rng = Seed::new(4).to_rng();
        let input = Waveform::mono(vec![0.5; 8]);
        for pipeline in [Pipeline::default(), Pipeline::with_max_active(Vec::new(), 3).unwrap()] {
            assert_eq!(pipeline.apply(&input, 16000, &mut rng), input);
        }
    }

    #[test]
    fn test_remove_kind() {
        let mut pipeline = Pipeline::new(gains(3));
        pipeline.push(Transform::new(0.5, TimeMasking::default()).unwrap());
        assert_eq!(pipeline.remove_kind(TransformKind::Gain), 3);
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.remove_kind(TransformKind::Reverb), 0);
        assert!(pipeline.contains_kind(TransformKind::TimeMask));
    }

    #[test]
    fn test_mix_pool_shared() {
        let mut pipeline = Pipeline::new(vec![
            Transform::new(0.2, Polymix::default()).unwrap(),
            Transform::new(0.2, Distortion::default()).unwrap(),
            Transform::new(0.2, Polymix::default()).unwrap(),
        ]);
        let updated = pipeline.set_mix_samples(vec![Waveform::mono(vec![1.0; 4])]);
        assert_eq!(updated, 2);
        for transform in pipeline.transforms() {
            if let TransformOp::Mix(mix) = transform.op() {
                assert_eq!(mix.mix_samples().len(), 1);
            }
        }
    }
}
