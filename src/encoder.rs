//! Turns a raw request payload into the numeric vector a predictor expects.
//!
//! Two steps, in a fixed order: categorical fields are label-encoded first
//! (the feature lists reference the encoded names, e.g. `State_encoded`),
//! then the vector is assembled by walking the feature list — never the
//! payload — so key order in the request can not change the result.

use crate::artifact::LabelEncoder;
use crate::error::PredictError;
use serde_json::Value;

/// Raw request body: flat string-keyed JSON object.
pub type Payload = serde_json::Map<String, Value>;

/// Fixed input columns of the crop recommendation model.
pub const CROP_FEATURES: [&str; 7] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Replace a raw categorical field with its integer code.
///
/// A payload without the field is left untouched; the feature list decides
/// later whether the encoded column was actually required. A present value
/// must be a string known to the encoder. On success the raw field is
/// removed and `<field>_encoded` inserted, so the raw string can never leak
/// into the numeric vector.
pub fn encode_categorical(
    payload: &mut Payload,
    field: &str,
    encoder: &LabelEncoder,
) -> Result<(), PredictError> {
    let code = match payload.get(field) {
        None => return Ok(()),
        Some(Value::String(value)) => {
            encoder
                .encode(value)
                .ok_or_else(|| PredictError::UnknownCategory {
                    field: field.to_string(),
                    value: value.clone(),
                })?
        }
        Some(_) => return Err(PredictError::InvalidValue(field.to_string())),
    };
    payload.remove(field);
    payload.insert(format!("{field}_encoded"), Value::from(code as u64));
    Ok(())
}

/// Assemble the numeric vector in feature-list order.
pub fn build_vector<S: AsRef<str>>(
    payload: &Payload,
    features: &[S],
) -> Result<Vec<f64>, PredictError> {
    features
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let value = payload
                .get(name)
                .ok_or_else(|| PredictError::missing(name))?;
            coerce_number(name, value)
        })
        .collect()
}

/// JSON numbers pass through; numeric strings parse; everything else is
/// invalid, as are NaN and infinities.
fn coerce_number(field: &str, value: &Value) -> Result<f64, PredictError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| PredictError::InvalidValue(field.to_string()))
}
