use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::audio::analysis::MfccPipeline;
use crate::audio::decode::decode_audio;
use crate::audio::features::Fingerprint;
use crate::config::{AnalysisConfig, ModelConfig};
use crate::error::SpeakerIdError;
use crate::model::speaker::{Label, SpeakerModel};
use crate::model::store;

/// Everything one operator works with: the pipeline, the model and the most
/// recently loaded fingerprint.
///
/// Each operation either succeeds and returns a status line, or fails and
/// leaves the session exactly as it was.
pub struct Session {
    pipeline: MfccPipeline,
    max_duration_secs: f64,
    model: SpeakerModel,
    k: usize,
    current: Option<Fingerprint>,
    training_data: Option<PathBuf>,
}

impl Session {
    pub fn new(analysis: &AnalysisConfig, model_cfg: &ModelConfig) -> Result<Self> {
        let pipeline = MfccPipeline::new(analysis)?;
        Ok(Self {
            pipeline,
            max_duration_secs: analysis.max_duration_secs,
            model: SpeakerModel::new(model_cfg.metric),
            k: model_cfg.k,
            current: None,
            training_data: None,
        })
    }

    /// Persists enrollments to `path`, restoring any samples already there.
    pub fn with_training_data(mut self, path: PathBuf) -> Result<Self> {
        if path.exists() {
            let stored = store::load_training_set(&path)?;
            stored.restore_into(&mut self.model, self.pipeline.config_id())?;
        } else {
            log::info!("Training data will be written to {}", path.display());
        }
        self.training_data = Some(path);
        Ok(self)
    }

    pub fn load(&mut self, path: &Path) -> Result<String> {
        let waveform = decode_audio(path, self.max_duration_secs)?;
        let fingerprint = self
            .pipeline
            .extract_fingerprint(&waveform)
            .with_context(|| format!("Failed to process {}", path.display()))?;
        self.current = Some(fingerprint);
        Ok(format!(
            "Audio file processed successfully ({:.2}s).",
            waveform.duration_secs()
        ))
    }

    pub fn enroll(&mut self, label: Label) -> Result<String> {
        let fingerprint = self.current.as_ref().ok_or(SpeakerIdError::NoFingerprint)?;

        let mut staged = self.model.clone();
        staged.enroll(fingerprint, label)?;
        if let Some(path) = &self.training_data {
            store::save_training_set(path, self.pipeline.config_id(), &staged)?;
        }
        self.model = staged;

        Ok(format!(
            "Training sample {} with label {} added.",
            self.model.len(),
            label
        ))
    }

    /// Parses an operator-typed label and enrolls under it.
    pub fn enroll_input(&mut self, input: &str) -> Result<String> {
        let label: Label = input.trim().parse().map_err(|_| {
            SpeakerIdError::InvalidInput(format!("'{}' is not a valid numeric label", input.trim()))
        })?;
        self.enroll(label)
    }

    pub fn train(&mut self) -> Result<String> {
        let k = self.model.train(self.k)?;
        Ok(format!(
            "Model trained on {} samples from {} speakers (k={}, {}).",
            self.model.len(),
            self.model.label_counts().len(),
            k,
            self.model.metric()
        ))
    }

    pub fn classify(&self) -> Result<String> {
        if !self.model.is_trained() {
            return Err(SpeakerIdError::ModelNotTrained.into());
        }
        let fingerprint = self.current.as_ref().ok_or(SpeakerIdError::NoFingerprint)?;
        let result = self.model.classify(fingerprint)?;
        Ok(format!(
            "Speaker identified: {} ({}/{} votes)",
            result.label,
            result.votes,
            result.neighbors.len()
        ))
    }
}
