//! Error types for the feature pipeline and speaker model.

use thiserror::Error;

use crate::audio::features::FeatureConfigId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeakerIdError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Pipeline errors
    #[error("Spectral transform failed: {0}")]
    Transform(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    // Model errors
    #[error("Fingerprint dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Fingerprint was computed with {actual}, model expects {expected}")]
    ConfigMismatch {
        expected: FeatureConfigId,
        actual: FeatureConfigId,
    },

    #[error("At least {required} training samples are required, have {available}")]
    InsufficientTrainingData { required: usize, available: usize },

    #[error("Model is not trained")]
    ModelNotTrained,

    // Session errors
    #[error("No fingerprint loaded, load an audio file first")]
    NoFingerprint,
}

pub type Result<T> = std::result::Result<T, SpeakerIdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_display() {
        let error = SpeakerIdError::DimensionMismatch {
            expected: 13,
            actual: 12,
        };
        assert_eq!(
            error.to_string(),
            "Fingerprint dimension mismatch: expected 13, got 12"
        );
    }

    #[test]
    fn insufficient_training_data_display() {
        let error = SpeakerIdError::InsufficientTrainingData {
            required: 2,
            available: 1,
        };
        assert_eq!(
            error.to_string(),
            "At least 2 training samples are required, have 1"
        );
    }

    #[test]
    fn converts_into_anyhow_and_back() {
        let error: anyhow::Error = SpeakerIdError::ModelNotTrained.into();
        assert_eq!(
            error.downcast_ref::<SpeakerIdError>(),
            Some(&SpeakerIdError::ModelNotTrained)
        );
    }
}
