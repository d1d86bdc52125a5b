//! Offline training for the crop recommendation model.
//!
//! Reads the labelled crop dataset, fits a one-vs-rest logistic classifier
//! and writes the artifact (predictor + label encoder) that the service
//! loads at startup. Rows with missing or unparseable values are dropped.

use agro_backend::artifact::{CropArtifact, LabelEncoder, MultiClassPredictor};
use agro_backend::encoder::CROP_FEATURES;
use agro_backend::store::CROP_MODEL_FILE;
use anyhow::{bail, Context, Result};
use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DATASET: &str = "datasets/Crop_recommendation.csv";
const MODELS_DIR: &str = "models";
const MAX_ITERATIONS: u64 = 150;

#[derive(Debug, Deserialize)]
struct CropRow {
    #[serde(rename = "N")]
    n: f64,
    #[serde(rename = "P")]
    p: f64,
    #[serde(rename = "K")]
    k: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
    label: String,
}

impl CropRow {
    fn features(&self) -> [f64; 7] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    fn is_clean(&self) -> bool {
        self.features().iter().all(|v| v.is_finite()) && !self.label.is_empty()
    }
}

fn main() -> Result<()> {
    println!("loading {DATASET}");
    let mut reader = csv::Reader::from_path(DATASET)
        .with_context(|| format!("opening {DATASET}"))?;

    let rows: Vec<CropRow> = reader
        .deserialize()
        .filter_map(|row: std::result::Result<CropRow, csv::Error>| row.ok())
        .filter(CropRow::is_clean)
        .collect();
    if rows.len() < 10 {
        bail!("{DATASET} yielded only {} usable rows", rows.len());
    }

    let label_encoder = LabelEncoder::fit(rows.iter().map(|r| r.label.as_str()));
    println!(
        "{} rows, {} classes: {:?}",
        rows.len(),
        label_encoder.len(),
        label_encoder.classes()
    );

    let targets: Vec<usize> = rows
        .iter()
        .map(|r| label_encoder.encode(&r.label).expect("label just fitted"))
        .collect();

    // Every fifth row is held out. The source file is grouped by label, so a
    // head/tail split would starve whole classes out of the training set.
    let holdout = |i: &usize| i % 5 == 4;
    let (valid_idx, train_idx): (Vec<usize>, Vec<usize>) =
        (0..rows.len()).partition(holdout);

    let predictor = fit_one_vs_rest(
        &rows,
        &targets,
        &train_idx,
        label_encoder.len(),
    )?;

    let correct = valid_idx
        .iter()
        .filter(|&&i| predictor.predict(&rows[i].features()) == targets[i])
        .count();
    println!(
        "holdout accuracy: {:.4} ({}/{} rows)",
        correct as f64 / valid_idx.len() as f64,
        correct,
        valid_idx.len()
    );

    let artifact = CropArtifact {
        predictor,
        label_encoder,
    };
    fs::create_dir_all(MODELS_DIR).context("creating models directory")?;
    let out = Path::new(MODELS_DIR).join(CROP_MODEL_FILE);
    artifact.save(&out)?;
    println!("saved {}", out.display());
    Ok(())
}

/// One binary logistic fit per class, class-vs-rest; the service-side
/// predictor takes the argmax over the per-class scores.
fn fit_one_vs_rest(
    rows: &[CropRow],
    targets: &[usize],
    train_idx: &[usize],
    n_classes: usize,
) -> Result<MultiClassPredictor> {
    let n_features = CROP_FEATURES.len();
    let flat: Vec<f64> = train_idx
        .iter()
        .flat_map(|&i| rows[i].features())
        .collect();
    let records = Array2::from_shape_vec((train_idx.len(), n_features), flat)
        .context("shaping training matrix")?;

    let mut intercepts = Vec::with_capacity(n_classes);
    let mut weights = Vec::with_capacity(n_classes);
    for class in 0..n_classes {
        let binary: Array1<i32> = train_idx
            .iter()
            .map(|&i| i32::from(targets[i] == class))
            .collect();
        let dataset = Dataset::new(records.clone(), binary);
        let fitted = LogisticRegression::default()
            .max_iterations(MAX_ITERATIONS)
            .fit(&dataset)
            .with_context(|| format!("fitting class {class}"))?;
        intercepts.push(fitted.intercept());
        weights.push(fitted.params().to_vec());
    }

    Ok(MultiClassPredictor {
        intercepts,
        weights,
    })
}
