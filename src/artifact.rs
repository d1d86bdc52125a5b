//! Model artifacts as stored on disk.
//!
//! An artifact is a self-contained bincode bundle: the fitted predictor
//! parameters plus whatever encoders and feature ordering the predictor was
//! trained with. The training binaries write these; the service loads them
//! once at startup and never mutates them.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Bidirectional mapping between category strings and dense integer codes.
///
/// Built once at training time from observed values, sorted order. Lookups
/// of values outside the fitted set return `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        LabelEncoder {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        // Class sets here are tens of entries; a linear scan beats carrying
        // a lookup map through serialization.
        self.classes.iter().position(|c| c == value)
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Linear regressor: intercept + weights, one weight per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl LinearPredictor {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// One-vs-rest logistic classifier: one (intercept, weights) row per class.
///
/// Prediction scores each class with a sigmoid over its linear term and
/// returns the index of the best-scoring class. Row order matches the label
/// encoder bundled alongside this predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiClassPredictor {
    pub intercepts: Vec<f64>,
    pub weights: Vec<Vec<f64>>,
}

impl MultiClassPredictor {
    pub fn predict(&self, features: &[f64]) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, (intercept, weights)) in
            self.intercepts.iter().zip(&self.weights).enumerate()
        {
            let z = intercept
                + weights.iter().zip(features).map(|(w, x)| w * x).sum::<f64>();
            let score = 1.0 / (1.0 + (-z).exp());
            if score > best_score {
                best = idx;
                best_score = score;
            }
        }
        best
    }

    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }
}

/// A categorical input column and the encoder fitted for it at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalField {
    pub name: String,
    pub encoder: LabelEncoder,
}

/// Crop recommendation bundle: classifier + decoder from class index back to
/// the crop-name label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropArtifact {
    pub predictor: MultiClassPredictor,
    pub label_encoder: LabelEncoder,
}

impl CropArtifact {
    pub fn save(&self, path: &Path) -> Result<()> {
        save_bundle(self, path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_bundle(path)
    }
}

/// Yield prediction bundle: regressor + the ordered feature-name list the
/// regressor was fit with + encoders for its categorical inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldArtifact {
    pub predictor: LinearPredictor,
    pub features: Vec<String>,
    pub categoricals: Vec<CategoricalField>,
}

impl YieldArtifact {
    pub fn save(&self, path: &Path) -> Result<()> {
        save_bundle(self, path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_bundle(path)
    }
}

fn save_bundle<T: Serialize>(bundle: &T, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(bundle).context("serializing model artifact")?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn load_bundle<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    bincode::deserialize(&bytes).with_context(|| format!("decoding {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_encoder_round_trip() {
        let enc = LabelEncoder::fit(["rice", "maize", "rice", "cotton"]);
        assert_eq!(enc.len(), 3);
        // Sorted order, duplicates collapsed.
        let classes: Vec<&str> = enc.classes().iter().map(String::as_str).collect();
        assert_eq!(classes, ["cotton", "maize", "rice"]);
        for label in ["cotton", "maize", "rice"] {
            let code = enc.encode(label).unwrap();
            assert_eq!(enc.decode(code), Some(label));
        }
    }

    #[test]
    fn label_encoder_rejects_unknown() {
        let enc = LabelEncoder::fit(["Assam", "Punjab"]);
        assert_eq!(enc.encode("Atlantis"), None);
        assert_eq!(enc.decode(99), None);
    }

    #[test]
    fn linear_predictor_forward_pass() {
        let model = LinearPredictor {
            intercept: 0.5,
            weights: vec![2.0, -1.0],
        };
        assert_eq!(model.predict(&[3.0, 4.0]), 0.5 + 6.0 - 4.0);
    }

    #[test]
    fn multiclass_predictor_picks_best_scoring_class() {
        let model = MultiClassPredictor {
            intercepts: vec![0.0, 0.0],
            weights: vec![vec![1.0, 0.0], vec![-1.0, 0.0]],
        };
        assert_eq!(model.predict(&[2.0, 7.0]), 0);
        assert_eq!(model.predict(&[-2.0, 7.0]), 1);
    }

    #[test]
    fn artifacts_survive_a_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        let crop = CropArtifact {
            predictor: MultiClassPredictor {
                intercepts: vec![0.1, -0.2],
                weights: vec![vec![1.0; 7], vec![-1.0; 7]],
            },
            label_encoder: LabelEncoder::fit(["maize", "rice"]),
        };
        let path = dir.path().join("model_crop.bin");
        crop.save(&path).unwrap();
        assert_eq!(CropArtifact::load(&path).unwrap(), crop);

        let yield_model = YieldArtifact {
            predictor: LinearPredictor {
                intercept: 1.0,
                weights: vec![0.5, 2.0],
            },
            features: vec!["Area".into(), "State_encoded".into()],
            categoricals: vec![CategoricalField {
                name: "State".into(),
                encoder: LabelEncoder::fit(["Assam", "Punjab"]),
            }],
        };
        let path = dir.path().join("model_yield.bin");
        yield_model.save(&path).unwrap();
        assert_eq!(YieldArtifact::load(&path).unwrap(), yield_model);
    }

    #[test]
    fn loading_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_crop.bin");
        fs::write(&path, b"not an artifact").unwrap();
        assert!(CropArtifact::load(&path).is_err());
    }
}
