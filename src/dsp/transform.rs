//! Transform definition
//!
//! A `Transform` is a probability gate wrapped around one concrete
//! augmentation (`TransformOp`). The catalog is closed: every algorithm is
//! a variant of `TransformOp`, and `TransformKind` is the matching tag used
//! for removal by kind and for logging.
//!
//! Invoking a transform never fails. Algorithm bodies return `Result`; the
//! gated wrapper logs any error and hands back the input unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::dsp::{
    AddNoise, Distortion, FrequencyMasking, Gain, PitchShift, Polymix, Reverb, TimeMasking,
    TimeStretch,
};
use crate::engine::Waveform;
use crate::error::{AugmentError, Result};

// ============================================================================
// Augment trait
// ============================================================================

/// Algorithm body shared by every concrete transform
pub trait Augment {
    /// Tag of this transform in the catalog
    const KIND: TransformKind;

    /// Gate probability used when none is given
    const DEFAULT_PROBABILITY: f32;

    /// Check parameter ranges
    fn validate(&self) -> Result<()>;

    /// Transform `waveform` unconditionally
    ///
    /// Implementations must return a buffer of the same shape as the input
    /// or an error; they must not panic on degenerate shapes.
    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform>;
}

// ============================================================================
// Kinds
// ============================================================================

/// Tag identifying a transform variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Gain,
    Noise,
    PitchShift,
    TimeStretch,
    FreqMask,
    TimeMask,
    Reverb,
    Distortion,
    Mix,
}

impl TransformKind {
    /// All kinds, in catalog order
    pub const ALL: [TransformKind; 9] = [
        TransformKind::Gain,
        TransformKind::Noise,
        TransformKind::PitchShift,
        TransformKind::TimeStretch,
        TransformKind::FreqMask,
        TransformKind::TimeMask,
        TransformKind::Reverb,
        TransformKind::Distortion,
        TransformKind::Mix,
    ];

    /// String identifier (matches the serialized `type` tag)
    pub fn name(&self) -> &'static str {
        match self {
            TransformKind::Gain => "gain",
            TransformKind::Noise => "noise",
            TransformKind::PitchShift => "pitch_shift",
            TransformKind::TimeStretch => "time_stretch",
            TransformKind::FreqMask => "freq_mask",
            TransformKind::TimeMask => "time_mask",
            TransformKind::Reverb => "reverb",
            TransformKind::Distortion => "distortion",
            TransformKind::Mix => "mix",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Concrete augmentation carried by a `Transform`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformOp {
    Gain(Gain),
    Noise(AddNoise),
    PitchShift(PitchShift),
    TimeStretch(TimeStretch),
    FreqMask(FrequencyMasking),
    TimeMask(TimeMasking),
    Reverb(Reverb),
    Distortion(Distortion),
    Mix(Polymix),
}

/// Run `$body` with `$op` bound to the concrete transform inside `$value`
macro_rules! dispatch {
    ($value:expr, $op:ident => $body:expr) => {
        match $value {
            TransformOp::Gain($op) => $body,
            TransformOp::Noise($op) => $body,
            TransformOp::PitchShift($op) => $body,
            TransformOp::TimeStretch($op) => $body,
            TransformOp::FreqMask($op) => $body,
            TransformOp::TimeMask($op) => $body,
            TransformOp::Reverb($op) => $body,
            TransformOp::Distortion($op) => $body,
            TransformOp::Mix($op) => $body,
        }
    };
}

/// Generic access to an `Augment` impl's associated constants
fn kind_of<A: Augment>(_: &A) -> TransformKind {
    A::KIND
}

fn default_probability_of<A: Augment>(_: &A) -> f32 {
    A::DEFAULT_PROBABILITY
}

impl TransformOp {
    pub fn kind(&self) -> TransformKind {
        dispatch!(self, op => kind_of(op))
    }

    pub fn default_probability(&self) -> f32 {
        dispatch!(self, op => default_probability_of(op))
    }

    pub fn validate(&self) -> Result<()> {
        dispatch!(self, op => op.validate())
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        dispatch!(self, op => op.apply(waveform, sample_rate, rng))
    }
}

macro_rules! impl_from_op {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TransformOp {
                fn from(op: $ty) -> Self {
                    TransformOp::$variant(op)
                }
            }
        )*
    };
}

impl_from_op!(
    Gain(Gain),
    Noise(AddNoise),
    PitchShift(PitchShift),
    TimeStretch(TimeStretch),
    FreqMask(FrequencyMasking),
    TimeMask(TimeMasking),
    Reverb(Reverb),
    Distortion(Distortion),
    Mix(Polymix),
);

// ============================================================================
// Transform
// ============================================================================

/// What happened to one transform during an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The probability gate stayed closed
    Skipped,
    /// The algorithm ran and its output was kept
    Applied,
    /// The algorithm failed; the input was passed through
    Recovered { code: &'static str },
}

/// Probability-gated augmentation
///
/// # Example
/// ```
/// use waveaug::dsp::{Gain, Transform};
/// use waveaug::engine::{Seed, Waveform};
///
/// let transform = Transform::new(1.0, Gain::fixed(-6.0)).unwrap();
/// let mut rng = Seed::new(7).to_rng();
/// let out = transform.invoke(&Waveform::mono(vec![1.0; 8]), 16000, &mut rng);
/// assert!((out.channel(0)[0] - 0.501187).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    probability: f32,
    #[serde(flatten)]
    op: TransformOp,
}

impl Transform {
    /// Create a transform
    ///
    /// # Errors
    /// `InvalidProbability` if `probability` is outside `[0, 1]`, or the
    /// parameter error reported by the operation's `validate`
    pub fn new(probability: f32, op: impl Into<TransformOp>) -> Result<Self> {
        let transform = Self::from_parts(probability, op);
        transform.validate()?;
        Ok(transform)
    }

    /// Create a transform gated at the operation's default probability
    pub fn with_default_probability(op: impl Into<TransformOp>) -> Result<Self> {
        let op = op.into();
        let probability = op.default_probability();
        Self::new(probability, op)
    }

    /// Build without validation; used for built-in parameter sets
    pub(crate) fn from_parts(probability: f32, op: impl Into<TransformOp>) -> Self {
        Self {
            probability,
            op: op.into(),
        }
    }

    /// Check the probability and the operation's parameters
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(AugmentError::InvalidProbability {
                transform: self.kind().name().to_string(),
                value: self.probability,
            });
        }
        self.op.validate()
    }

    pub fn kind(&self) -> TransformKind {
        self.op.kind()
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    /// Change the gate probability
    pub fn set_probability(&mut self, probability: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(AugmentError::InvalidProbability {
                transform: self.kind().name().to_string(),
                value: probability,
            });
        }
        self.probability = probability;
        Ok(())
    }

    pub fn op(&self) -> &TransformOp {
        &self.op
    }

    /// Replace the mix pool if this is a mix transform
    ///
    /// # Returns
    /// true if the pool was replaced
    pub fn set_mix_samples(&mut self, samples: Vec<Waveform>) -> bool {
        match &mut self.op {
            TransformOp::Mix(mix) => {
                mix.set_mix_samples(samples);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn op_mut(&mut self) -> &mut TransformOp {
        &mut self.op
    }

    /// Run the algorithm without the gate or the fail-soft fallback
    pub fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        self.op.apply(waveform, sample_rate, rng)
    }

    /// Gated, fail-soft invocation
    ///
    /// Draws one uniform value; when it falls below `probability` the
    /// algorithm runs. Any failure is logged and the input is returned.
    pub fn invoke<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Waveform {
        self.invoke_with_outcome(waveform.clone(), sample_rate, rng).0
    }

    /// Same as `invoke`, taking ownership and reporting what happened
    pub fn invoke_with_outcome<R: Rng + ?Sized>(
        &self,
        waveform: Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> (Waveform, Outcome) {
        if rng.random::<f32>() >= self.probability {
            trace!(transform = %self.kind(), "gate closed");
            return (waveform, Outcome::Skipped);
        }

        match self.guarded_apply(&waveform, sample_rate, rng) {
            Ok(output) => {
                trace!(transform = %self.kind(), "applied");
                (output, Outcome::Applied)
            }
            Err(err) => {
                warn!(
                    transform = %self.kind(),
                    code = err.error_code(),
                    "{}; returning input unchanged",
                    err
                );
                (
                    waveform,
                    Outcome::Recovered {
                        code: err.error_code(),
                    },
                )
            }
        }
    }

    /// Run the algorithm and reject output that breaks the shape or
    /// finiteness contract
    fn guarded_apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let output = self.op.apply(waveform, sample_rate, rng)?;
        if output.shape() != waveform.shape() {
            return Err(AugmentError::ShapeMismatch {
                expected: waveform.shape(),
                found: output.shape(),
            });
        }
        if !output.is_finite() {
            return Err(AugmentError::numerical(format!(
                "{} produced non-finite samples",
                self.kind()
            )));
        }
        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================
