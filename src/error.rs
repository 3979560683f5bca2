//! Error types for reading ingestion and advisory generation.

use serde::Serialize;

/// Why an inbound message was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("payload is not valid JSON: {0}")]
    Decode(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or empty sensor id")]
    MissingSensorId,

    #[error("water height is missing or not numeric")]
    WaterHeightNotNumeric,

    #[error("water height {0} cm is outside the accepted range")]
    WaterHeightOutOfRange(f64),

    #[error("unrecognized status label: {0:?}")]
    UnknownStatus(String),
}

/// Failure of a single advisory attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdvisoryError {
    /// The service could not be reached, answered with a non-success
    /// status, or did not answer before the timeout.
    #[error("advisory service unreachable: {0}")]
    Unreachable(String),

    /// The service answered but the body did not match the report structure.
    #[error("advisory response malformed: {0}")]
    BadResponse(String),
}

/// Wire form of an [`AdvisoryError`] sent to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryFailure {
    pub kind: &'static str,
    pub error: &'static str,
}

impl AdvisoryError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisoryError::Unreachable(_) => "unreachable",
            AdvisoryError::BadResponse(_) => "bad_response",
        }
    }

    /// Message suitable for a dashboard banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AdvisoryError::Unreachable(_) => "Could not reach the advisory assistant.",
            AdvisoryError::BadResponse(_) => {
                "Could not understand the advisory assistant's response."
            }
        }
    }

    pub fn to_failure(&self) -> AdvisoryFailure {
        AdvisoryFailure {
            kind: self.kind(),
            error: self.user_message(),
        }
    }
}

/// Invalid advisory configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
