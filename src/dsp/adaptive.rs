//! Loss-driven augmentation strength
//!
//! `AdaptiveController` keeps a strength in `[0.1, max_strength]` and
//! nudges it after every training step: up when the observed loss is
//! below the target (the model is coping), down otherwise. A pipeline is
//! derived from the current strength by scaling each base transform's
//! probability and the number of transforms allowed per invocation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::{
    AddNoise, FrequencyMasking, Gain, PitchShift, Pipeline, TimeMasking, TimeStretch, Transform,
};
use crate::error::{AugmentError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Lowest strength the controller will reach
pub const MIN_STRENGTH: f32 = 0.1;

/// Loss target used by `AdaptiveController::update`
pub const DEFAULT_TARGET_LOSS: f32 = 2.0;

/// Transforms allowed per invocation at strength 1.0
const MAX_ACTIVE_AT_FULL_STRENGTH: f32 = 3.0;

// ============================================================================
// Configuration
// ============================================================================

/// Controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub initial_strength: f32,
    pub max_strength: f32,
    pub adaptation_rate: f32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            initial_strength: 0.5,
            max_strength: 1.0,
            adaptation_rate: 0.001,
        }
    }
}

impl AdaptiveConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.max_strength.is_finite() || self.max_strength < MIN_STRENGTH {
            return Err(AugmentError::invalid_parameter(
                "max_strength",
                self.max_strength,
                format!("a finite value >= {}", MIN_STRENGTH),
            ));
        }
        if !self.initial_strength.is_finite() {
            return Err(AugmentError::invalid_parameter(
                "initial_strength",
                self.initial_strength,
                "a finite value",
            ));
        }
        if !self.adaptation_rate.is_finite() || self.adaptation_rate < 0.0 {
            return Err(AugmentError::invalid_parameter(
                "adaptation_rate",
                self.adaptation_rate,
                "a finite value >= 0",
            ));
        }
        Ok(())
    }
}

/// Base transforms scaled by the controller, at their strength-1.0
/// probabilities
pub fn default_base_transforms() -> Vec<Transform> {
    vec![
        Transform::from_parts(0.4, Gain::default()),
        Transform::from_parts(0.2, AddNoise::default()),
        Transform::from_parts(0.3, PitchShift::default()),
        Transform::from_parts(0.3, TimeStretch::default()),
        Transform::from_parts(0.3, FrequencyMasking::default()),
        Transform::from_parts(0.2, TimeMasking::default()),
    ]
}

// ============================================================================
// Controller
// ============================================================================

/// Adaptive augmentation strength tracker
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    config: AdaptiveConfig,
    current_strength: f32,
    step_count: u64,
    base: Vec<Transform>,
}

impl AdaptiveController {
    /// Create a controller over the default base transforms
    pub fn new(config: AdaptiveConfig) -> Result<Self> {
        Self::with_base_transforms(config, default_base_transforms())
    }

    /// Create a controller over custom base transforms
    pub fn with_base_transforms(config: AdaptiveConfig, base: Vec<Transform>) -> Result<Self> {
        config.validate()?;
        for transform in &base {
            transform.validate()?;
        }
        let current_strength = config
            .initial_strength
            .clamp(MIN_STRENGTH, config.max_strength);
        Ok(Self {
            config,
            current_strength,
            step_count: 0,
            base,
        })
    }

    pub fn strength(&self) -> f32 {
        self.current_strength
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Record one loss observation against the default target
    pub fn update(&mut self, loss: f32) -> f32 {
        self.update_with_target(loss, DEFAULT_TARGET_LOSS)
    }

    /// Record one loss observation
    ///
    /// # Returns
    /// The new strength
    pub fn update_with_target(&mut self, loss: f32, target_loss: f32) -> f32 {
        self.step_count += 1;
        let delta = if loss < target_loss {
            self.config.adaptation_rate
        } else {
            -self.config.adaptation_rate
        };
        self.current_strength =
            (self.current_strength + delta).clamp(MIN_STRENGTH, self.config.max_strength);

        debug!(
            step = self.step_count,
            loss,
            target_loss,
            strength = self.current_strength,
            "augmentation strength updated"
        );
        self.current_strength
    }

    /// Return to the initial strength and a zero step count
    pub fn reset(&mut self) {
        self.current_strength = self
            .config
            .initial_strength
            .clamp(MIN_STRENGTH, self.config.max_strength);
        self.step_count = 0;
    }

    /// `max(1, round(3 * strength))`
    pub fn max_active(&self) -> usize {
        ((MAX_ACTIVE_AT_FULL_STRENGTH * self.current_strength).round() as usize).max(1)
    }

    /// Build a bounded pipeline for the current strength
    pub fn derive_pipeline(&self) -> Pipeline {
        let transforms = self
            .base
            .iter()
            .map(|t| {
                let probability = (t.probability() * self.current_strength).clamp(0.0, 1.0);
                Transform::from_parts(probability, t.op().clone())
            })
            .collect();
        Pipeline::from_parts(transforms, self.max_active())
    }
}

impl Default for AdaptiveController {
    fn default() -> Self {
        Self {
            config: AdaptiveConfig::default(),
            current_strength: AdaptiveConfig::default().initial_strength,
            step_count: 0,
            base: default_base_transforms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_low_loss_increases_strength() {
        let mut controller = AdaptiveController::default();
        for _ in 0..100 {
            controller.update(1.5);
        }
        assert_relative_eq!(controller.strength(), 0.6, epsilon = 1e-4);
        assert_eq!(controller.step_count(), 100);
    }

    #[test]
    fn test_high_loss_decreases_strength() {
        let mut controller = AdaptiveController::default();
        for _ in 0..100 {
            controller.update(2.5);
        }
        assert_relative_eq!(controller.strength(), 0.4, epsilon = 1e-4);
    }

    #[test]
    fn test_strength_clamped() {
        let config = AdaptiveConfig {
            initial_strength: 0.5,
            max_strength: 0.8,
            adaptation_rate: 0.1,
        };
        let mut controller = AdaptiveController::new(config).unwrap();
        for _ in 0..20 {
            controller.update(0.0);
        }
        assert_relative_eq!(controller.strength(), 0.8);
        for _ in 0..20 {
            controller.update(10.0);
        }
        assert_relative_eq!(controller.strength(), MIN_STRENGTH);
    }

    #[test]
    fn test_loss_equal_to_target_decreases() {
        let mut controller = AdaptiveController::default();
        controller.update_with_target(1.0, 1.0);
        assert!(controller.strength() < 0.5);
    }

    #[test]
    fn test_derive_pipeline_scales_probabilities() {
        let config = AdaptiveConfig {
            initial_strength: 0.5,
            ..AdaptiveConfig::default()
        };
        let controller = AdaptiveController::new(config).unwrap();
        let pipeline = controller.derive_pipeline();

        assert_eq!(pipeline.max_active(), Some(2));
        let probabilities: Vec<f32> = pipeline.transforms().iter().map(|t| t.probability()).collect();
        let expected = [0.2, 0.1, 0.15, 0.15, 0.15, 0.1];
        for (p, e) in probabilities.iter().zip(expected.iter()) {
            assert_relative_eq!(*p, *e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_probabilities_clamped_above_one() {
        let config = AdaptiveConfig {
            initial_strength: 4.0,
            max_strength: 4.0,
            adaptation_rate: 0.0,
        };
        let controller = AdaptiveController::new(config).unwrap();
        let pipeline = controller.derive_pipeline();
        assert!(pipeline.transforms().iter().all(|t| t.probability() <= 1.0));
        assert_eq!(pipeline.max_active(), Some(12));
    }

    #[test]
    fn test_min_strength_keeps_one_active() {
        let config = AdaptiveConfig {
            initial_strength: 0.0,
            ..AdaptiveConfig::default()
        };
        let controller = AdaptiveController::new(config).unwrap();
        assert_relative_eq!(controller.strength(), MIN_STRENGTH);
        assert_eq!(controller.max_active(), 1);
    }

    #[test]
    fn test_reset() {
        let mut controller = AdaptiveController::default();
        controller.update(0.5);
        controller.reset();
        assert_relative_eq!(controller.strength(), 0.5);
        assert_eq!(controller.step_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AdaptiveConfig {
            adaptation_rate: -0.1,
            ..AdaptiveConfig::default()
        };
        assert!(AdaptiveController::new(config).is_err());
    }
}
