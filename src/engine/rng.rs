//! Seedable randomness
//!
//! The engine never owns a generator. Every randomized operation takes a
//! caller-supplied `&mut R where R: Rng + ?Sized`; `Seed` produces the
//! reproducible `ChaCha8Rng` used by the CLI and the tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

/// Generator type produced by [`Seed::to_rng`]
pub type AugmentRng = ChaCha8Rng;

// ============================================================================
// Seed
// ============================================================================

/// A seed for deterministic random number generation.
///
/// # Example
///
/// ```rust
/// use rand::Rng;
/// use waveaug::engine::Seed;
///
/// let mut rng1 = Seed::new(42).to_rng();
/// let mut rng2 = Seed::new(42).to_rng();
/// assert_eq!(rng1.random::<f32>(), rng2.random::<f32>());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed(u64);

impl Seed {
    /// Create a new seed with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Create a seed from the operating system's entropy source.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(rand::rng().random())
    }

    /// Get the underlying seed value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Create a new random number generator from this seed.
    #[must_use]
    pub fn to_rng(&self) -> AugmentRng {
        ChaCha8Rng::seed_from_u64(self.0)
    }

    /// Derive an independent seed from this one using a key.
    ///
    /// Useful for giving each batch worker its own stream from one master
    /// seed.
    #[must_use]
    pub fn derive(&self, key: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        key.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Parameter ranges
// ============================================================================

/// Closed interval a transform parameter is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range that always yields `value`
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Check that both ends are finite and `min <= max`
    pub fn validate(&self, param: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(AugmentError::InvalidRange {
                param: param.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Same as `validate`, and additionally require `min >= floor`
    pub fn validate_above(&self, param: &str, floor: f32, inclusive: bool) -> Result<()> {
        self.validate(param)?;
        let ok = if inclusive {
            self.min >= floor
        } else {
            self.min > floor
        };
        if !ok {
            return Err(AugmentError::InvalidRange {
                param: param.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Draw a value uniformly from `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

// ============================================================================
// Draw helpers
// ============================================================================

/// Standard normal draw (Box-Muller)
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // 1 - u keeps the log argument in (0, 1]
    let u1: f32 = 1.0 - rng.random::<f32>();
    let u2: f32 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Vector of independent standard normal draws
pub fn normal_vec<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<f32> {
    (0..len).map(|_| standard_normal(rng)).collect()
}

/// Uniform integer in `[low, high]`, both ends inclusive
pub fn randint<R: Rng + ?Sized>(rng: &mut R, low: usize, high: usize) -> usize {
    if high <= low {
        low
    } else {
        rng.random_range(low..=high)
    }
}
