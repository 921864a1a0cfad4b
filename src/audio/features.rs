use serde::{Deserialize, Serialize};
use std::fmt;

use super::frame::Window;
use crate::config::AnalysisConfig;

/// Decoded mono audio, consumed once by the framer.
#[derive(Clone, Debug)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Identifies the analysis parameters a fingerprint was produced under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureConfigId {
    pub sample_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
    pub num_coefficients: usize,
    pub num_filters: usize,
    pub window: Window,
}

impl From<&AnalysisConfig> for FeatureConfigId {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            sample_rate: cfg.sample_rate,
            frame_size: cfg.frame_size,
            hop_size: cfg.hop_size(),
            num_coefficients: cfg.num_coefficients,
            num_filters: cfg.num_filters,
            window: cfg.window,
        }
    }
}

impl fmt::Display for FeatureConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz/{}x{}/{}mfcc/{}mel/{}",
            self.sample_rate,
            self.frame_size,
            self.hop_size,
            self.num_coefficients,
            self.num_filters,
            self.window
        )
    }
}

/// Mean MFCC vector of one utterance, the unit of comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub coefficients: Vec<f64>,
    pub config: FeatureConfigId,
}

impl Fingerprint {
    pub fn new(coefficients: Vec<f64>, config: FeatureConfigId) -> Self {
        Self {
            coefficients,
            config,
        }
    }

    pub fn dimension(&self) -> usize {
        self.coefficients.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.coefficients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_id_tracks_effective_hop() {
        let cfg = AnalysisConfig::default();
        let id = FeatureConfigId::from(&cfg);
        assert_eq!(id.hop_size, cfg.frame_size);
        assert_eq!(id.to_string(), "44100Hz/512x512/13mfcc/26mel/hamming");
    }

    #[test]
    fn duration_of_one_second() {
        let wave = Waveform::new(vec![0.0; 44_100], 44_100);
        assert!((wave.duration_secs() - 1.0).abs() < 1e-12);
    }
}
