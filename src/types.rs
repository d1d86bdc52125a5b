//! Request and response types for the HTTP boundary.

use crate::encoder::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /predict/crop`: the seven numeric features, kept as raw
/// JSON values until the encoder coerces them (numbers or numeric strings
/// are both accepted).
#[derive(Debug, Default, Deserialize)]
pub struct CropRequest {
    #[serde(flatten)]
    pub fields: Payload,
}

/// Body of `POST /predict/yield`: model-specific numeric fields plus the
/// optional categorical inputs, which must be strings if present.
#[derive(Debug, Default, Deserialize)]
pub struct YieldRequest {
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Crop")]
    pub crop: Option<String>,
    #[serde(flatten)]
    pub fields: Payload,
}

impl YieldRequest {
    /// Fold the typed categorical fields back into the flat payload the
    /// encoder works on.
    pub fn into_payload(self) -> Payload {
        let mut payload = self.fields;
        if let Some(state) = self.state {
            payload.insert("State".to_string(), Value::String(state));
        }
        if let Some(crop) = self.crop {
            payload.insert("Crop".to_string(), Value::String(crop));
        }
        payload
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse<T: Serialize> {
    pub prediction: T,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub available: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            error: message.into(),
        }
    }
}
