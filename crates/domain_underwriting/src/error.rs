//! Underwriting domain errors
//!
//! Three families of failure exist in the engine and each is handled at a
//! different boundary:
//!
//! - [`ConfigurationError`] is raised while the service is being built and
//!   prevents it from serving any request.
//! - [`DataError`] belongs to a single applicant record. It is returned to the
//!   caller for that record only and never aborts a batch.
//! - [`ModelError`] comes from the risk predictor. The scorer recovers from it
//!   by substituting a neutral probability and flagging the decision.

use thiserror::Error;

/// Invalid engine configuration, detected at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Decision band thresholds are not strictly increasing
    #[error("Decision bands must satisfy low < medium < high (got low={low}, medium={medium}, high={high})")]
    UnorderedBands {
        low: String,
        medium: String,
        high: String,
    },

    /// A threshold or parameter lies outside its permitted range
    #[error("Configuration value {field}={value} is out of range: {expected}")]
    OutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// A hard rule id in the rule list is not known to the engine
    #[error("Unknown hard rule: {0}")]
    UnknownRule(String),

    /// A hard rule id appears more than once in the rule list
    #[error("Hard rule configured more than once: {0}")]
    DuplicateRule(String),

    /// A soft rule penalty was configured for a name the engine does not know
    #[error("Unknown soft rule: {0}")]
    UnknownSoftRule(String),

    /// Model parameters could not be trained or loaded
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The configuration source itself could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigurationError {
    /// Creates an out-of-range error
    pub fn out_of_range(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        ConfigurationError::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Creates an invalid model error
    pub fn invalid_model(message: impl Into<String>) -> Self {
        ConfigurationError::InvalidModel(message.into())
    }
}

/// A problem with one applicant record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A field required for this record is absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field holds a value outside its permitted range
    #[error("Field {field}={value} is out of range: {expected}")]
    OutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The record could not be read as an applicant at all
    #[error("Malformed applicant record: {0}")]
    Malformed(String),

    /// Evaluation of this record panicked; other records are unaffected
    #[error("Evaluation aborted for this record: {0}")]
    EvaluationPanicked(String),
}

impl DataError {
    /// Creates a missing field error
    pub fn missing(field: impl Into<String>) -> Self {
        DataError::MissingField(field.into())
    }

    /// Creates an out-of-range error
    pub fn out_of_range(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        DataError::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Name of the field involved, when the error concerns a single field
    pub fn field(&self) -> Option<&str> {
        match self {
            DataError::MissingField(field) => Some(field),
            DataError::OutOfRange { field, .. } => Some(field),
            DataError::Malformed(_) | DataError::EvaluationPanicked(_) => None,
        }
    }
}

/// Risk predictor failures, always recovered by the scorer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// No trained model is installed
    #[error("Risk model unavailable: {0}")]
    Unavailable(String),

    /// The feature vector does not match what the model was trained on
    #[error("Feature mismatch: model expects {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },
}
