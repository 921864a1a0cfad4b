use serde::{Deserialize, Serialize};
use std::fmt;

use super::features::Waveform;
use crate::config::AnalysisConfig;
use crate::error::{Result, SpeakerIdError};

/// Taper applied to every frame before the FFT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    #[default]
    Hamming,
    Hann,
    /// No taper. Leaks more energy across bins than the others.
    Rectangular,
}

impl Window {
    pub fn coefficients(self, size: usize) -> Vec<f64> {
        if size < 2 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f64;
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * i as f64 / denom;
                match self {
                    Window::Hamming => 0.54 - 0.46 * phase.cos(),
                    Window::Hann => 0.5 * (1.0 - phase.cos()),
                    Window::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Window::Hamming => "hamming",
            Window::Hann => "hann",
            Window::Rectangular => "rectangular",
        };
        f.write_str(name)
    }
}

/// Slices a waveform into fixed-size windowed frames.
///
/// Only whole frames are produced; a trailing remainder shorter than
/// `frame_size` is dropped.
#[derive(Clone, Debug)]
pub struct Framer {
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    max_samples: usize,
    window: Vec<f64>,
}

impl Framer {
    pub fn new(cfg: &AnalysisConfig) -> Result<Self> {
        let hop_size = cfg.hop_size();
        if cfg.frame_size == 0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "frame size must be positive".into(),
            ));
        }
        if hop_size == 0 || hop_size > cfg.frame_size {
            return Err(SpeakerIdError::InvalidConfiguration(format!(
                "hop size {} must be in 1..={}",
                hop_size, cfg.frame_size
            )));
        }
        if cfg.sample_rate == 0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "sample rate must be positive".into(),
            ));
        }
        if cfg.max_duration_secs.is_nan() || cfg.max_duration_secs <= 0.0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "max duration must be positive".into(),
            ));
        }

        Ok(Self {
            sample_rate: cfg.sample_rate,
            frame_size: cfg.frame_size,
            hop_size,
            max_samples: (cfg.max_duration_secs * cfg.sample_rate as f64) as usize,
            window: cfg.window.coefficients(cfg.frame_size),
        })
    }

    /// Number of whole frames `frames` will yield for `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.frame_size {
            0
        } else {
            1 + (len - self.frame_size) / self.hop_size
        }
    }

    pub fn frames<'a>(&'a self, waveform: &'a Waveform) -> Result<Frames<'a>> {
        if waveform.samples.is_empty() {
            return Err(SpeakerIdError::InvalidInput("waveform is empty".into()));
        }
        if waveform.sample_rate != self.sample_rate {
            return Err(SpeakerIdError::InvalidInput(format!(
                "sample rate mismatch: expected {}Hz, got {}Hz",
                self.sample_rate, waveform.sample_rate
            )));
        }
        if waveform.samples.len() > self.max_samples {
            return Err(SpeakerIdError::InvalidInput(format!(
                "waveform too long: {:.1}s exceeds the {:.1}s limit",
                waveform.duration_secs(),
                self.max_samples as f64 / self.sample_rate as f64
            )));
        }

        Ok(Frames {
            framer: self,
            samples: &waveform.samples,
            pos: 0,
        })
    }
}

/// Iterator over windowed frames. Clone it to restart from the same point.
#[derive(Clone, Debug)]
pub struct Frames<'a> {
    framer: &'a Framer,
    samples: &'a [f32],
    pos: usize,
}

impl Iterator for Frames<'_> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.pos + self.framer.frame_size;
        if end > self.samples.len() {
            return None;
        }
        let frame = self.samples[self.pos..end]
            .iter()
            .zip(self.framer.window.iter())
            .map(|(&s, &w)| s as f64 * w)
            .collect();
        self.pos += self.framer.hop_size;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .framer
            .frame_count(self.samples.len().saturating_sub(self.pos));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}
