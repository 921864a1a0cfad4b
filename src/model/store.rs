use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::knn::NeighborSearch;
use super::speaker::{SpeakerModel, TrainingSample};
use crate::audio::features::{FeatureConfigId, Fingerprint};

/// On-disk form of a training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrainingSet {
    pub config: FeatureConfigId,
    pub samples: Vec<TrainingSample>,
}

impl StoredTrainingSet {
    /// Replaces the contents of `model` with the stored samples. `model` is
    /// left untouched unless the stored config matches `expected` and every
    /// sample is accepted.
    pub fn restore_into<S: NeighborSearch + Clone>(
        &self,
        model: &mut SpeakerModel<S>,
        expected: FeatureConfigId,
    ) -> Result<()> {
        if self.config != expected {
            anyhow::bail!(
                "Training data was computed with {}, current analysis uses {}",
                self.config,
                expected
            );
        }

        let mut staged = model.clone();
        staged.reset();
        for (i, sample) in self.samples.iter().enumerate() {
            let fingerprint = Fingerprint::new(sample.features.clone(), self.config);
            staged
                .enroll(&fingerprint, sample.label)
                .with_context(|| format!("Invalid training sample #{}", i + 1))?;
        }
        *model = staged;
        Ok(())
    }
}

pub fn save_training_set<S: NeighborSearch>(
    path: &Path,
    config: FeatureConfigId,
    model: &SpeakerModel<S>,
) -> Result<()> {
    let stored = StoredTrainingSet {
        config,
        samples: model.samples().to_vec(),
    };
    let json = serde_json::to_string_pretty(&stored)?;
    replace_file(path, |file| Ok(file.write_all(json.as_bytes())?))?;
    log::info!(
        "Saved {} training samples to {}",
        stored.samples.len(),
        path.display()
    );
    Ok(())
}

/// Writes through a temp file beside `path` and renames it over `path`, which
/// therefore holds either its previous content or the complete new one.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    write(tmp.as_file_mut())
        .and_then(|()| Ok(tmp.as_file().sync_all()?))
        .with_context(|| format!("Failed to write training data: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace training data: {}", path.display()))?;
    Ok(())
}

pub fn load_training_set(path: &Path) -> Result<StoredTrainingSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read training data: {}", path.display()))?;
    let stored: StoredTrainingSet = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse training data: {}", path.display()))?;
    log::info!(
        "Loaded {} training samples from {}",
        stored.samples.len(),
        path.display()
    );
    Ok(stored)
}
