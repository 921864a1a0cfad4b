use super::features::{FeatureConfigId, Fingerprint, Waveform};
use super::frame::Framer;
use super::mel::{CepstralProjector, MelFilterbank};
use super::spectrum::SpectralAnalyzer;
use crate::config::AnalysisConfig;
use crate::error::{Result, SpeakerIdError};

/// Waveform to fingerprint: frame, FFT, mel, DCT, mean pool.
///
/// Everything that depends only on the configuration (window, FFT plan,
/// filter weights, DCT basis) is built once in [`MfccPipeline::new`].
pub struct MfccPipeline {
    config_id: FeatureConfigId,
    framer: Framer,
    analyzer: SpectralAnalyzer,
    filterbank: MelFilterbank,
    projector: CepstralProjector,
}

impl MfccPipeline {
    pub fn new(cfg: &AnalysisConfig) -> Result<Self> {
        let framer = Framer::new(cfg)?;
        let projector = CepstralProjector::new(cfg.num_coefficients, cfg.num_filters)?;
        let analyzer = SpectralAnalyzer::new(cfg.frame_size)?;
        let filterbank = MelFilterbank::new(cfg.num_filters, cfg.frame_size, cfg.sample_rate)?;
        let config_id = FeatureConfigId::from(cfg);

        log::info!("MFCC pipeline ready: {}", config_id);

        Ok(Self {
            config_id,
            framer,
            analyzer,
            filterbank,
            projector,
        })
    }

    pub fn config_id(&self) -> FeatureConfigId {
        self.config_id
    }

    pub fn num_coefficients(&self) -> usize {
        self.projector.num_coefficients()
    }

    /// Per-frame MFCC matrix, one row per whole frame.
    pub fn frame_coefficients(&mut self, waveform: &Waveform) -> Result<Vec<Vec<f64>>> {
        let frames = self.framer.frames(waveform)?;
        let mut rows = Vec::with_capacity(frames.len());
        for frame in frames {
            let power = self.analyzer.power_spectrum(&frame)?;
            let energies = self.filterbank.apply(&power);
            rows.push(self.projector.project(&energies));
        }
        log::debug!(
            "Extracted {} frames of {} coefficients",
            rows.len(),
            self.num_coefficients()
        );
        Ok(rows)
    }

    pub fn extract_fingerprint(&mut self, waveform: &Waveform) -> Result<Fingerprint> {
        let rows = self.frame_coefficients(waveform)?;
        let coefficients = mean_pool(&rows)?;
        Ok(Fingerprint::new(coefficients, self.config_id))
    }
}

/// Coefficient-wise arithmetic mean across frames.
pub fn mean_pool(rows: &[Vec<f64>]) -> Result<Vec<f64>> {
    let first = rows.first().ok_or_else(|| {
        SpeakerIdError::InsufficientData("waveform is shorter than one analysis frame".into())
    })?;

    let mut sums = vec![0.0; first.len()];
    for row in rows {
        if row.len() != sums.len() {
            return Err(SpeakerIdError::DimensionMismatch {
                expected: sums.len(),
                actual: row.len(),
            });
        }
        for (sum, &v) in sums.iter_mut().zip(row) {
            *sum += v;
        }
    }

    let n = rows.len() as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}
