use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::knn::{majority_vote, BruteForce, DistanceMetric, Neighbor, NeighborSearch};
use crate::audio::features::{FeatureConfigId, Fingerprint};
use crate::error::{Result, SpeakerIdError};

pub type Label = i32;

/// Fewest enrolled samples `train` accepts.
pub const MIN_TRAINING_SAMPLES: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    pub label: Label,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Untrained,
    Trained { k: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub label: Label,
    pub votes: usize,
    pub neighbors: Vec<Neighbor>,
}

/// Labeled fingerprints plus a k-nearest-neighbor classifier over them.
///
/// Any enrollment drops the model back to [`ModelState::Untrained`], so a
/// classification always reflects every enrolled sample.
#[derive(Clone, Debug)]
pub struct SpeakerModel<S = BruteForce> {
    samples: Vec<TrainingSample>,
    dimension: Option<usize>,
    config: Option<FeatureConfigId>,
    metric: DistanceMetric,
    search: S,
    state: ModelState,
}

impl SpeakerModel<BruteForce> {
    pub fn new(metric: DistanceMetric) -> Self {
        Self::with_search(metric, BruteForce)
    }
}

impl Default for SpeakerModel<BruteForce> {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}

impl<S: NeighborSearch> SpeakerModel<S> {
    pub fn with_search(metric: DistanceMetric, search: S) -> Self {
        Self {
            samples: Vec::new(),
            dimension: None,
            config: None,
            metric,
            search,
            state: ModelState::Untrained,
        }
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained { .. })
    }

    pub fn effective_k(&self) -> Option<usize> {
        match self.state {
            ModelState::Trained { k } => Some(k),
            ModelState::Untrained => None,
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn label_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_insert(0) += 1;
        }
        counts
    }

    fn check_compatible(&self, fingerprint: &Fingerprint) -> Result<()> {
        if let Some(expected) = self.dimension {
            if fingerprint.dimension() != expected {
                return Err(SpeakerIdError::DimensionMismatch {
                    expected,
                    actual: fingerprint.dimension(),
                });
            }
        }
        if let Some(expected) = self.config {
            if fingerprint.config != expected {
                return Err(SpeakerIdError::ConfigMismatch {
                    expected,
                    actual: fingerprint.config,
                });
            }
        }
        Ok(())
    }

    pub fn enroll(&mut self, fingerprint: &Fingerprint, label: Label) -> Result<()> {
        if fingerprint.dimension() == 0 {
            return Err(SpeakerIdError::DimensionMismatch {
                expected: self.dimension.unwrap_or(fingerprint.config.num_coefficients),
                actual: 0,
            });
        }
        self.check_compatible(fingerprint)?;

        self.dimension = Some(fingerprint.dimension());
        self.config = Some(fingerprint.config);
        self.samples.push(TrainingSample {
            features: fingerprint.coefficients.clone(),
            label,
        });
        if self.is_trained() {
            log::debug!("Enrollment invalidated the trained model");
        }
        self.state = ModelState::Untrained;
        Ok(())
    }

    /// Freezes the neighborhood size for classification. `k` is clamped to the
    /// number of enrolled samples.
    pub fn train(&mut self, k_requested: usize) -> Result<usize> {
        if k_requested == 0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "k must be at least 1".into(),
            ));
        }
        if self.samples.len() < MIN_TRAINING_SAMPLES {
            return Err(SpeakerIdError::InsufficientTrainingData {
                required: MIN_TRAINING_SAMPLES,
                available: self.samples.len(),
            });
        }

        let k = k_requested.min(self.samples.len());
        self.state = ModelState::Trained { k };
        log::info!(
            "Trained on {} samples ({} speakers), k={}, metric={}",
            self.samples.len(),
            self.label_counts().len(),
            k,
            self.metric
        );
        Ok(k)
    }

    pub fn classify(&self, fingerprint: &Fingerprint) -> Result<Classification> {
        let k = self.effective_k().ok_or(SpeakerIdError::ModelNotTrained)?;
        self.check_compatible(fingerprint)?;

        let neighbors = self
            .search
            .nearest(fingerprint.as_slice(), &self.samples, k, self.metric);
        for n in &neighbors {
            log::debug!("neighbor #{} label={} distance={:.4}", n.index, n.label, n.distance);
        }
        let (label, votes) = majority_vote(&neighbors).ok_or(SpeakerIdError::ModelNotTrained)?;

        Ok(Classification {
            label,
            votes,
            neighbors,
        })
    }

    /// Forgets every sample along with the fixed dimension and config.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.dimension = None;
        self.config = None;
        self.state = ModelState::Untrained;
    }
}
