use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::audio::frame::Window;
use crate::model::knn::DistanceMetric;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// Parameters of the MFCC pipeline. Fixed per deployment: fingerprints from
/// different analysis configs are never compared.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    /// Defaults to `frame_size` (disjoint frames) when omitted.
    #[serde(default)]
    pub hop_size: Option<usize>,
    #[serde(default = "default_num_coefficients")]
    pub num_coefficients: usize,
    #[serde(default = "default_num_filters")]
    pub num_filters: usize,
    #[serde(default)]
    pub window: Window,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl AnalysisConfig {
    pub fn hop_size(&self) -> usize {
        self.hop_size.unwrap_or(self.frame_size)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_size: default_frame_size(),
            hop_size: None,
            num_coefficients: default_num_coefficients(),
            num_filters: default_num_filters(),
            window: Window::default(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            metric: DistanceMetric::default(),
        }
    }
}

fn default_sample_rate() -> u32 { 44_100 }
fn default_frame_size() -> usize { 512 }
fn default_num_coefficients() -> usize { 13 }
fn default_num_filters() -> usize { 26 }
fn default_max_duration_secs() -> f64 { 600.0 }
fn default_k() -> usize { 3 }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert_eq!(cfg.analysis.sample_rate, 44_100);
        assert_eq!(cfg.analysis.frame_size, 512);
        assert_eq!(cfg.analysis.hop_size(), 512);
        assert_eq!(cfg.analysis.num_coefficients, 13);
        assert_eq!(cfg.model.k, 3);
        assert_eq!(cfg.model.metric, DistanceMetric::Euclidean);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = parse_config(
            r#"
            [analysis]
            frame_size = 1024
            hop_size = 256
            window = "hann"

            [model]
            k = 5
            metric = "manhattan"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.frame_size, 1024);
        assert_eq!(cfg.analysis.hop_size(), 256);
        assert_eq!(cfg.analysis.window, Window::Hann);
        assert_eq!(cfg.analysis.num_filters, 26);
        assert_eq!(cfg.model.k, 5);
        assert_eq!(cfg.model.metric, DistanceMetric::Manhattan);
    }

    #[test]
    fn unknown_window_is_rejected() {
        let result = parse_config("[analysis]\nwindow = \"blackman\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/speakerid.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
