//! Gain Transform
//!
//! Random volume change: one gain in dB is drawn per invocation and applied
//! to every sample of every channel.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::transform::{Augment, TransformKind};
use crate::engine::{db_to_linear, ParamRange, Waveform};
use crate::error::{AugmentError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Largest gain magnitude a configuration may ask for
const MAX_GAIN_DB: f32 = 48.0;

// ============================================================================
// Gain
// ============================================================================

/// Random gain adjustment
///
/// # Parameters
/// - `gain_range_db`: Interval the gain in dB is drawn from (default ±6 dB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gain {
    pub gain_range_db: ParamRange,
}

impl Default for Gain {
    fn default() -> Self {
        Self {
            gain_range_db: ParamRange::new(-6.0, 6.0),
        }
    }
}

impl Gain {
    /// Symmetric range `[-max_db, max_db]`
    pub fn symmetric(max_db: f32) -> Self {
        Self {
            gain_range_db: ParamRange::new(-max_db, max_db),
        }
    }

    /// Always apply exactly `gain_db`
    pub fn fixed(gain_db: f32) -> Self {
        Self {
            gain_range_db: ParamRange::fixed(gain_db),
        }
    }
}

impl Augment for Gain {
    const KIND: TransformKind = TransformKind::Gain;
    const DEFAULT_PROBABILITY: f32 = 0.4;

    fn validate(&self) -> Result<()> {
        self.gain_range_db.validate("gain_range_db")?;
        if self.gain_range_db.min < -MAX_GAIN_DB || self.gain_range_db.max > MAX_GAIN_DB {
            return Err(AugmentError::InvalidRange {
                param: "gain_range_db".to_string(),
                min: self.gain_range_db.min,
                max: self.gain_range_db.max,
            });
        }
        Ok(())
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        waveform: &Waveform,
        _sample_rate: u32,
        rng: &mut R,
    ) -> Result<Waveform> {
        let gain_db = self.gain_range_db.sample(rng);
        let mut output = waveform.clone();
        output.scale(db_to_linear(gain_db));
        Ok(output)
    }
}
