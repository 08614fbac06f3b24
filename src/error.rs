//! Error handling for Waveaug
//!
//! Errors fall into three groups:
//! - Configuration errors: invalid probabilities, ranges or parameters,
//!   surfaced at construction time.
//! - Transform execution errors: numerical or shape failures inside a
//!   transform body. These never leave `Transform::invoke`; the transform
//!   falls back to its input instead.
//! - I/O errors from the WAV, config and CLI surfaces.

use thiserror::Error;

/// Result type alias for Waveaug operations
pub type Result<T> = std::result::Result<T, AugmentError>;

/// Main error type for Waveaug operations
#[derive(Error, Debug)]
pub enum AugmentError {
    // Configuration Errors
    #[error("Invalid probability for {transform}: {value} (expected 0.0 to 1.0)")]
    InvalidProbability { transform: String, value: f32 },

    #[error("Invalid range for {param}: [{min}, {max}]")]
    InvalidRange { param: String, min: f32, max: f32 },

    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Ragged waveform: channel {channel} has {found} samples, expected {expected}")]
    RaggedWaveform {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Pipeline configuration has no transforms")]
    MissingTransforms,

    // Transform Execution Errors
    #[error("{transform}: buffer of {actual} samples is too short (need {required})")]
    BufferTooShort {
        transform: String,
        required: usize,
        actual: usize,
    },

    #[error("Invalid sample rate: {sample_rate}")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Numerical failure: {reason}")]
    NumericalFailure { reason: String },

    #[error("Mix sample has no channels")]
    EmptyMixSample,

    // I/O Errors
    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AugmentError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AugmentError::InvalidProbability { .. } => "INVALID_PROBABILITY",
            AugmentError::InvalidRange { .. } => "INVALID_RANGE",
            AugmentError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AugmentError::RaggedWaveform { .. } => "RAGGED_WAVEFORM",
            AugmentError::MissingTransforms => "MISSING_TRANSFORMS",
            AugmentError::BufferTooShort { .. } => "BUFFER_TOO_SHORT",
            AugmentError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            AugmentError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            AugmentError::NumericalFailure { .. } => "NUMERICAL_FAILURE",
            AugmentError::EmptyMixSample => "EMPTY_MIX_SAMPLE",
            AugmentError::InvalidAudio { .. } => "INVALID_AUDIO",
            AugmentError::Io(_) => "IO_ERROR",
            AugmentError::Wav(_) => "WAV_ERROR",
            AugmentError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error was raised while building a transform or pipeline
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AugmentError::InvalidProbability { .. }
                | AugmentError::InvalidRange { .. }
                | AugmentError::InvalidParameter { .. }
                | AugmentError::RaggedWaveform { .. }
                | AugmentError::MissingTransforms
        )
    }

    /// Check if a transform can recover from this error by returning its input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AugmentError::BufferTooShort { .. }
                | AugmentError::InvalidSampleRate { .. }
                | AugmentError::ShapeMismatch { .. }
                | AugmentError::NumericalFailure { .. }
                | AugmentError::EmptyMixSample
        )
    }

    pub(crate) fn invalid_parameter(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        AugmentError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    pub(crate) fn numerical(reason: impl Into<String>) -> Self {
        AugmentError::NumericalFailure {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AugmentError::InvalidProbability {
            transform: "gain".to_string(),
            value: 1.5,
        };
        assert_eq!(err.error_code(), "INVALID_PROBABILITY");
        assert!(err.is_configuration_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_execution_errors_are_recoverable() {
        let err = AugmentError::BufferTooShort {
            transform: "freq_mask".to_string(),
            required: 513,
            actual: 4,
        };
        assert!(err.is_recoverable());
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_io_errors_are_neither() {
        let err = AugmentError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_recoverable());
        assert!(!err.is_configuration_error());
    }
}
