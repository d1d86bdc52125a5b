use thiserror::Error;

/// Everything that can go wrong while serving a prediction request.
///
/// Client-caused failures (missing/unknown/invalid input) map to 400 at the
/// HTTP boundary; the rest map to 500. The mapping lives in the route layer,
/// this enum stays framework-free.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("{0} model not loaded")]
    ModelUnavailable(&'static str),

    #[error("missing feature(s): {}", .0.join(", "))]
    MissingFeature(Vec<String>),

    #[error("unknown {field} '{value}'")]
    UnknownCategory { field: String, value: String },

    #[error("invalid value for feature '{0}'")]
    InvalidValue(String),

    #[error("prediction failed: {0}")]
    Unexpected(String),
}

impl PredictError {
    pub fn missing(field: &str) -> Self {
        PredictError::MissingFeature(vec![field.to_string()])
    }

    /// True for failures the caller can fix by changing the payload.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::MissingFeature(_)
                | PredictError::UnknownCategory { .. }
                | PredictError::InvalidValue(_)
        )
    }
}
