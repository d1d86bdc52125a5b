//! Orchestration of store lookup, feature encoding and predictor invocation.

use crate::encoder::{build_vector, encode_categorical, CROP_FEATURES};
use crate::error::PredictError;
use crate::store::ModelStore;
use crate::types::{CropRequest, YieldRequest};

/// Immutable service context, built once at startup and shared read-only
/// across request handlers.
pub struct PredictionService {
    store: ModelStore,
}

impl PredictionService {
    pub fn new(store: ModelStore) -> Self {
        PredictionService { store }
    }

    pub fn available_models(&self) -> Vec<&'static str> {
        self.store.available()
    }

    /// Crop recommendation: seven fixed numeric features in, label out.
    pub fn predict_crop(&self, request: CropRequest) -> Result<String, PredictError> {
        let artifact = self
            .store
            .crop()
            .ok_or(PredictError::ModelUnavailable("crop"))?;

        let missing: Vec<String> = CROP_FEATURES
            .iter()
            .filter(|name| !request.fields.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::MissingFeature(missing));
        }

        let vector = build_vector(&request.fields, &CROP_FEATURES)?;
        let index = artifact.predictor.predict(&vector);
        let label = artifact.label_encoder.decode(index).ok_or_else(|| {
            PredictError::Unexpected(format!("class index {index} has no label"))
        })?;
        Ok(label.to_string())
    }

    /// Yield prediction: encode whatever categorical inputs the artifact
    /// declares, assemble the vector from its persisted feature list, round
    /// the result to 2 decimal places.
    pub fn predict_yield(&self, request: YieldRequest) -> Result<f64, PredictError> {
        let artifact = self
            .store
            .yield_model()
            .ok_or(PredictError::ModelUnavailable("yield"))?;

        let mut payload = request.into_payload();
        for categorical in &artifact.categoricals {
            encode_categorical(&mut payload, &categorical.name, &categorical.encoder)?;
        }

        let vector = build_vector(&payload, &artifact.features)?;
        let value = artifact.predictor.predict(&vector);
        Ok((value * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{
        CategoricalField, CropArtifact, LabelEncoder, LinearPredictor,
        MultiClassPredictor, YieldArtifact,
    };
    use serde_json::json;

    fn crop_artifact() -> CropArtifact {
        // Class 0 ("maize") wins when N is positive, class 1 ("rice")
        // otherwise; the remaining features carry no weight.
        CropArtifact {
            predictor: MultiClassPredictor {
                intercepts: vec![0.0, 0.0],
                weights: vec![
                    vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                ],
            },
            label_encoder: LabelEncoder::fit(["maize", "rice"]),
        }
    }

    fn yield_artifact() -> YieldArtifact {
        YieldArtifact {
            predictor: LinearPredictor {
                intercept: 0.5,
                weights: vec![2.0, 3.0],
            },
            features: vec!["Area".into(), "State_encoded".into()],
            categoricals: vec![CategoricalField {
                name: "State".into(),
                encoder: LabelEncoder::fit(["Assam", "Punjab"]),
            }],
        }
    }

    fn service() -> PredictionService {
        PredictionService::new(ModelStore::with_artifacts(
            Some(crop_artifact()),
            Some(yield_artifact()),
        ))
    }

    fn crop_request(value: serde_json::Value) -> CropRequest {
        serde_json::from_value(value).unwrap()
    }

    fn yield_request(value: serde_json::Value) -> YieldRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn crop_prediction_returns_a_known_label() {
        let label = service()
            .predict_crop(crop_request(json!({
                "N": 90, "P": 42, "K": 43,
                "temperature": 20.8, "humidity": 82.0,
                "ph": 6.5, "rainfall": 202.9
            })))
            .unwrap();
        assert_eq!(label, "maize");

        let label = service()
            .predict_crop(crop_request(json!({
                "N": -90, "P": 42, "K": 43,
                "temperature": 20.8, "humidity": 82.0,
                "ph": 6.5, "rainfall": 202.9
            })))
            .unwrap();
        assert_eq!(label, "rice");
    }

    #[test]
    fn crop_reports_every_missing_field() {
        let err = service()
            .predict_crop(crop_request(json!({"N": 90, "K": 43})))
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::MissingFeature(vec![
                "P".into(),
                "temperature".into(),
                "humidity".into(),
                "ph".into(),
                "rainfall".into()
            ])
        );
    }

    #[test]
    fn crop_without_model_is_unavailable() {
        let service = PredictionService::new(ModelStore::with_artifacts(None, None));
        let err = service.predict_crop(CropRequest::default()).unwrap_err();
        assert_eq!(err, PredictError::ModelUnavailable("crop"));
    }

    #[test]
    fn yield_prediction_encodes_state_and_rounds() {
        // 0.5 + 2.0 * 1.234 + 3.0 * 1 (Punjab) = 5.968 -> 5.97
        let value = service()
            .predict_yield(yield_request(json!({
                "Area": 1.234,
                "State": "Punjab"
            })))
            .unwrap();
        assert_eq!(value, 5.97);
    }

    #[test]
    fn yield_rejects_unknown_state() {
        let err = service()
            .predict_yield(yield_request(json!({
                "Area": 1.0,
                "State": "Atlantis"
            })))
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCategory {
                field: "State".into(),
                value: "Atlantis".into()
            }
        );
    }

    #[test]
    fn yield_missing_encoded_feature_when_state_omitted() {
        // Without State the State_encoded column can not be filled; this is
        // the downstream missing-feature path.
        let err = service()
            .predict_yield(yield_request(json!({"Area": 1.0})))
            .unwrap_err();
        assert_eq!(err, PredictError::missing("State_encoded"));
    }

    #[test]
    fn payload_key_order_does_not_change_the_prediction() {
        let a = service()
            .predict_yield(yield_request(json!({"Area": 2.0, "State": "Assam"})))
            .unwrap();
        let b = service()
            .predict_yield(yield_request(json!({"State": "Assam", "Area": 2.0})))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn yield_without_model_is_unavailable() {
        let service = PredictionService::new(ModelStore::with_artifacts(None, None));
        let err = service.predict_yield(YieldRequest::default()).unwrap_err();
        assert_eq!(err, PredictError::ModelUnavailable("yield"));
    }
}
