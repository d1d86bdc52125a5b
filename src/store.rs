//! Startup-time loading of model artifacts.
//!
//! A missing or undecodable artifact file is not fatal: that model is simply
//! unavailable and its endpoint answers with a server error until the
//! operator trains it. Nothing is reloaded after startup.

use crate::artifact::{CropArtifact, YieldArtifact};
use anyhow::Result;
use log::{info, warn};
use std::path::Path;

pub const CROP_MODEL_FILE: &str = "model_crop.bin";
pub const YIELD_MODEL_FILE: &str = "model_yield.bin";

#[derive(Debug, Default)]
pub struct ModelStore {
    crop: Option<CropArtifact>,
    yield_model: Option<YieldArtifact>,
}

impl ModelStore {
    /// Try to load every known artifact from `dir`, skipping absentees.
    pub fn load(dir: &Path) -> Self {
        ModelStore {
            crop: load_artifact(dir, CROP_MODEL_FILE, "crop", CropArtifact::load),
            yield_model: load_artifact(dir, YIELD_MODEL_FILE, "yield", YieldArtifact::load),
        }
    }

    /// Store with artifacts supplied directly, bypassing disk.
    pub fn with_artifacts(
        crop: Option<CropArtifact>,
        yield_model: Option<YieldArtifact>,
    ) -> Self {
        ModelStore { crop, yield_model }
    }

    pub fn is_available(&self, name: &str) -> bool {
        match name {
            "crop" => self.crop.is_some(),
            "yield" => self.yield_model.is_some(),
            _ => false,
        }
    }

    pub fn crop(&self) -> Option<&CropArtifact> {
        self.crop.as_ref()
    }

    pub fn yield_model(&self) -> Option<&YieldArtifact> {
        self.yield_model.as_ref()
    }

    /// Names of the models that actually loaded, for the status endpoint.
    pub fn available(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.crop.is_some() {
            names.push("crop");
        }
        if self.yield_model.is_some() {
            names.push("yield");
        }
        names
    }
}

fn load_artifact<A>(
    dir: &Path,
    file: &str,
    name: &str,
    load: fn(&Path) -> Result<A>,
) -> Option<A> {
    let path = dir.join(file);
    if !path.exists() {
        warn!(
            "{} not found; '{}' predictions disabled until the model is trained",
            path.display(),
            name
        );
        return None;
    }
    match load(&path) {
        Ok(artifact) => {
            info!("loaded '{}' model from {}", name, path.display());
            Some(artifact)
        }
        Err(e) => {
            warn!("failed to load '{}' model from {}: {:#}", name, path.display(), e);
            None
        }
    }
}
