//! Pipeline configuration documents
//!
//! A `PipelineConfig` is the JSON form of a pipeline: an optional preset,
//! extra transforms appended after it, and an optional `max_active` bound.
//!
//! ```json
//! {
//!   "preset": "moderate",
//!   "include_mix": false,
//!   "max_active": 3,
//!   "transforms": [
//!     { "type": "reverb", "probability": 0.25 },
//!     { "type": "noise", "probability": 0.1, "color": "pink" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::{Pipeline, Preset, Transform};
use crate::error::{AugmentError, Result};

/// Serializable pipeline description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Preset whose transforms come first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    /// Append the preset's mix transform
    pub include_mix: bool,

    /// Bound on transforms visited per invocation; overrides the preset's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_active: Option<usize>,

    /// Transforms appended after the preset's
    pub transforms: Vec<Transform>,
}

impl PipelineConfig {
    /// Config that reproduces a preset exactly
    pub fn from_preset(preset: Preset, include_mix: bool) -> Self {
        Self {
            preset: Some(preset),
            include_mix,
            ..Self::default()
        }
    }

    /// Config listing a pipeline's transforms explicitly
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        Self {
            preset: None,
            include_mix: false,
            max_active: pipeline.max_active(),
            transforms: pipeline.transforms().to_vec(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Validate every transform and assemble the pipeline
    ///
    /// # Errors
    /// * `MissingTransforms` - No preset and no transforms
    /// * Any configuration error from `Transform::validate` or `max_active`
    pub fn build(&self) -> Result<Pipeline> {
        if self.preset.is_none() && self.transforms.is_empty() {
            return Err(AugmentError::MissingTransforms);
        }

        let mut pipeline = match self.preset {
            Some(preset) => preset.build(self.include_mix),
            None => Pipeline::default(),
        };
        for transform in &self.transforms {
            transform.validate()?;
            pipeline.push(transform.clone());
        }
        if self.max_active.is_some() {
            pipeline.set_max_active(self.max_active)?;
        }

        debug!(
            preset = self.preset.map(|p| p.name()),
            transforms = pipeline.len(),
            max_active = ?pipeline.max_active(),
            "pipeline built from config"
        );
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{NoiseColor, TransformKind, TransformOp};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_and_build() {
        let json = r#"{
            "preset": "moderate",
            "max_active": 3,
            "transforms": [
                { "type": "reverb", "probability": 0.25 },
                { "type": "noise", "probability": 0.1, "color": "pink" }
            ]
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        let pipeline = config.build().unwrap();

        assert_eq!(pipeline.len(), 9);
        assert_eq!(pipeline.max_active(), Some(3));
        assert!(pipeline.contains_kind(TransformKind::Reverb));
        match pipeline.transforms()[8].op() {
            TransformOp::Noise(noise) => assert_eq!(noise.color, NoiseColor::Pink),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{ "transforms": [ { "type": "gain", "probability": 0.4 } ] }"#;
        let pipeline = PipelineConfig::from_json_str(json).unwrap().build().unwrap();
        assert_eq!(pipeline.max_active(), None);
        assert_eq!(
            pipeline.transforms()[0],
            Transform::new(0.4, crate::dsp::Gain::default()).unwrap()
        );
    }

    #[test]
    fn test_empty_config_rejected() {
        let err = PipelineConfig::default().build().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_TRANSFORMS");
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let json = r#"{ "transforms": [ { "type": "gain", "probability": 1.5 } ] }"#;
        let err = PipelineConfig::from_json_str(json).unwrap().build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROBABILITY");
    }

    #[test]
    fn test_unknown_type_is_serialization_error() {
        let json = r#"{ "transforms": [ { "type": "chorus", "probability": 0.5 } ] }"#;
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let config = PipelineConfig::from_pipeline(&crate::dsp::presets::strong(false));
        config.save(&path).unwrap();

        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.build().unwrap(), crate::dsp::presets::strong(false));
    }

    #[test]
    fn test_preset_config_matches_preset() {
        let config = PipelineConfig::from_preset(Preset::Inference, true);
        assert_eq!(config.build().unwrap(), Preset::Inference.build(true));
    }
}
