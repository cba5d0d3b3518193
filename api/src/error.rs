//! Error taxonomy for the prediction pipeline.
//!
//! Errors carry no status codes; the HTTP boundary maps them in `handler.rs`.

use thiserror::Error;

/// Client-caused failures. Always rendered as 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("Missing `location_id` in request")]
    MissingLocationId,

    #[error("`location_id` must be a number, string or boolean")]
    InvalidLocationId,

    #[error("`timestamp` must be an ISO-8601 string")]
    InvalidTimestampType,

    #[error("Invalid isoformat string: '{0}'")]
    BadTimestamp(String),
}

/// Failures raised by a loaded model while predicting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("feature names seen at fit time, yet now missing: {0}")]
    MissingColumn(String),

    #[error("could not convert string to float: '{0}'")]
    NonNumeric(String),

    #[error("row has {got} values but {expected} columns")]
    RowShape { expected: usize, got: usize },

    #[error("model returned no predictions")]
    EmptyOutput,

    #[error("model returned a non-finite demand estimate: {0}")]
    NonFinite(f64),
}

/// Failures while reading a model artifact from disk.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Every way a single prediction request can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model is not available")]
    ServiceUnavailable,

    #[error("An error occurred: {0}")]
    Prediction(#[from] ModelError),

    #[error("An error occurred: {0}")]
    Unknown(String),
}

impl ApiError {
    /// True when the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_location_display() {
        let err = ApiError::from(ValidationError::MissingLocationId);
        assert_eq!(err.to_string(), "Missing `location_id` in request");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_bad_timestamp_display() {
        let err = ValidationError::BadTimestamp("not-a-date".to_string());
        assert_eq!(err.to_string(), "Invalid isoformat string: 'not-a-date'");
    }

    #[test]
    fn test_unavailable_display() {
        let err = ApiError::ServiceUnavailable;
        assert_eq!(err.to_string(), "Model is not available");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_prediction_error_wraps_model_message() {
        let err = ApiError::from(ModelError::NonNumeric("abc".to_string()));
        assert_eq!(
            err.to_string(),
            "An error occurred: could not convert string to float: 'abc'"
        );
        assert!(!err.is_client_error());
    }
}
