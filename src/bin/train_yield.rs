//! Offline training for the yield prediction model.
//!
//! The dataset schema is not fixed: numeric columns are detected from the
//! data, `State`/`Crop` string columns are label-encoded, and the target is
//! production per unit area (falling back to an explicit yield column).
//! The persisted artifact carries the exact feature-name order the model
//! was fit with; the service rebuilds its vectors from that list alone.

use agro_backend::artifact::{
    CategoricalField, LabelEncoder, LinearPredictor, YieldArtifact,
};
use agro_backend::store::YIELD_MODEL_FILE;
use anyhow::{bail, Context, Result};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const DATASET: &str = "datasets/crop_yield.csv";
const MODELS_DIR: &str = "models";

/// Columns never used as inputs: targets and bookkeeping.
const EXCLUDED_COLS: [&str; 4] = ["yield", "Yield", "Production", "Crop_Year"];
/// String columns encoded when present in the dataset.
const CATEGORICAL_COLS: [&str; 2] = ["State", "Crop"];

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn read(path: &str) -> Result<Self> {
        let mut reader =
            csv::Reader::from_path(path).with_context(|| format!("opening {path}"))?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() != headers.len() {
                continue;
            }
            let cells: Vec<String> =
                record.iter().map(|c| c.trim().to_string()).collect();
            // dropna: any empty cell disqualifies the row
            if cells.iter().any(String::is_empty) {
                continue;
            }
            rows.push(cells);
        }
        Ok(Table { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn is_numeric(&self, col: usize) -> bool {
        !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|row| row[col].parse::<f64>().map_or(false, |v| v.is_finite()))
    }

    fn numeric(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col].parse().expect("column checked numeric")
    }
}

fn main() -> Result<()> {
    println!("loading {DATASET}");
    let mut table = Table::read(DATASET)?;
    println!("{} usable rows", table.rows.len());

    let targets = target_column(&mut table)?;
    if table.rows.len() < 10 {
        bail!("{DATASET} yielded only {} usable rows", table.rows.len());
    }

    // Label-encode the string categorical columns that exist.
    let mut categoricals = Vec::new();
    let mut encoded_cols: Vec<(String, Vec<f64>)> = Vec::new();
    for name in CATEGORICAL_COLS {
        let Some(col) = table.column(name) else { continue };
        if table.is_numeric(col) {
            continue;
        }
        let encoder = LabelEncoder::fit(table.rows.iter().map(|r| r[col].as_str()));
        println!("encoded {} {name} values", encoder.len());
        let codes: Vec<f64> = table
            .rows
            .iter()
            .map(|r| encoder.encode(&r[col]).expect("value just fitted") as f64)
            .collect();
        encoded_cols.push((format!("{name}_encoded"), codes));
        categoricals.push(CategoricalField {
            name: name.to_string(),
            encoder,
        });
    }

    // Input features: numeric columns in header order minus the excluded
    // ones, then the encoded columns.
    let excluded: HashSet<&str> = EXCLUDED_COLS.into_iter().collect();
    let mut features: Vec<String> = Vec::new();
    let mut numeric_idx: Vec<usize> = Vec::new();
    for (col, name) in table.headers.iter().enumerate() {
        if excluded.contains(name.as_str()) || !table.is_numeric(col) {
            continue;
        }
        features.push(name.clone());
        numeric_idx.push(col);
    }
    for (name, _) in &encoded_cols {
        features.push(name.clone());
    }
    if features.is_empty() {
        bail!("no numeric feature columns in {DATASET}");
    }
    println!("using features: {features:?}");

    let n_rows = table.rows.len();
    let n_features = features.len();
    let mut flat = Vec::with_capacity(n_rows * n_features);
    for row in 0..n_rows {
        for &col in &numeric_idx {
            flat.push(table.numeric(row, col));
        }
        for (_, codes) in &encoded_cols {
            flat.push(codes[row]);
        }
    }
    let records =
        Array2::from_shape_vec((n_rows, n_features), flat).context("shaping matrix")?;
    let targets = Array1::from(targets);

    // Every fifth row held out, same scheme as the crop trainer.
    let holdout = |i: &usize| i % 5 == 4;
    let (valid_idx, train_idx): (Vec<usize>, Vec<usize>) = (0..n_rows).partition(holdout);

    let train_records = records.select(ndarray::Axis(0), &train_idx);
    let train_targets = targets.select(ndarray::Axis(0), &train_idx);
    let dataset = Dataset::new(train_records, train_targets);
    let fitted = LinearRegression::new()
        .fit(&dataset)
        .context("fitting regression")?;

    let predictor = LinearPredictor {
        intercept: fitted.intercept(),
        weights: fitted.params().to_vec(),
    };

    let sq_err: f64 = valid_idx
        .iter()
        .map(|&i| {
            let row: Vec<f64> = records.row(i).to_vec();
            let err = predictor.predict(&row) - targets[i];
            err * err
        })
        .sum();
    println!("holdout RMSE: {:.4}", (sq_err / valid_idx.len() as f64).sqrt());

    let artifact = YieldArtifact {
        predictor,
        features,
        categoricals,
    };
    fs::create_dir_all(MODELS_DIR).context("creating models directory")?;
    let out = Path::new(MODELS_DIR).join(YIELD_MODEL_FILE);
    artifact.save(&out)?;
    println!("saved {}", out.display());
    Ok(())
}

/// Production per unit area when both columns are present (rows without a
/// positive area are dropped); otherwise an explicit yield column.
fn target_column(table: &mut Table) -> Result<Vec<f64>> {
    if let (Some(production), Some(area)) =
        (table.column("Production"), table.column("Area"))
    {
        if table.is_numeric(production) && table.is_numeric(area) {
            table.rows.retain(|row| {
                row[area].parse::<f64>().map_or(false, |a| a > 0.0)
            });
            return Ok((0..table.rows.len())
                .map(|row| table.numeric(row, production) / table.numeric(row, area))
                .collect());
        }
    }
    for name in ["Yield", "yield"] {
        if let Some(col) = table.column(name) {
            if table.is_numeric(col) {
                return Ok((0..table.rows.len())
                    .map(|row| table.numeric(row, col))
                    .collect());
            }
        }
    }
    bail!("{DATASET} has neither Production/Area nor a yield column")
}
