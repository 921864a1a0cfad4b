//! Mel filterbank and cepstral projection.
//!
//! Triangular filters are spaced evenly on the HTK mel scale between 0 Hz and
//! Nyquist. Filter energies are log-compressed and projected onto an
//! orthonormal DCT-II basis, keeping the low-order coefficients.

use crate::error::{Result, SpeakerIdError};

/// Energies below this are clamped before `ln` so silence stays finite.
pub const LOG_FLOOR: f64 = 1e-10;

#[inline]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

#[inline]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Pre-computed triangular filter weights over the power spectrum bins.
#[derive(Clone, Debug)]
pub struct MelFilterbank {
    /// Per filter: first bin covered and its weights.
    filters: Vec<(usize, Vec<f64>)>,
    num_bins: usize,
}

impl MelFilterbank {
    pub fn new(num_filters: usize, fft_size: usize, sample_rate: u32) -> Result<Self> {
        if num_filters == 0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "filter count must be positive".into(),
            ));
        }

        let num_bins = fft_size / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let bin_hz = sample_rate as f64 / fft_size as f64;
        let mel_high = hz_to_mel(nyquist);

        // num_filters + 2 edges: each filter spans edges[f]..edges[f + 2]
        let edges: Vec<f64> = (0..num_filters + 2)
            .map(|i| mel_to_hz(mel_high * i as f64 / (num_filters + 1) as f64))
            .collect();

        let filters = edges
            .windows(3)
            .map(|w| {
                let (lo, center, hi) = (w[0], w[1], w[2]);
                let first = (lo / bin_hz).ceil() as usize;
                let last = ((hi / bin_hz).floor() as usize).min(num_bins - 1);
                let weights = (first..=last)
                    .map(|bin| {
                        let freq = bin as f64 * bin_hz;
                        let weight = if freq <= center {
                            (freq - lo) / (center - lo)
                        } else {
                            (hi - freq) / (hi - center)
                        };
                        weight.clamp(0.0, 1.0)
                    })
                    .collect();
                (first, weights)
            })
            .collect();

        Ok(Self { filters, num_bins })
    }

    /// Weighted energy per filter.
    pub fn apply(&self, power: &[f64]) -> Vec<f64> {
        debug_assert_eq!(power.len(), self.num_bins);
        self.filters
            .iter()
            .map(|(first, weights)| {
                power
                    .iter()
                    .skip(*first)
                    .zip(weights)
                    .map(|(p, w)| p * w)
                    .sum()
            })
            .collect()
    }
}

/// Log compression followed by a truncated orthonormal DCT-II.
#[derive(Clone, Debug)]
pub struct CepstralProjector {
    /// `num_coefficients` rows of `num_filters` cosine terms, scale folded in.
    basis: Vec<Vec<f64>>,
}

impl CepstralProjector {
    pub fn new(num_coefficients: usize, num_filters: usize) -> Result<Self> {
        if num_coefficients == 0 {
            return Err(SpeakerIdError::InvalidConfiguration(
                "coefficient count must be positive".into(),
            ));
        }
        if num_filters < num_coefficients {
            return Err(SpeakerIdError::InvalidConfiguration(format!(
                "filter count {} is smaller than coefficient count {}",
                num_filters, num_coefficients
            )));
        }

        let m = num_filters as f64;
        let basis = (0..num_coefficients)
            .map(|k| {
                let scale = if k == 0 { (1.0 / m).sqrt() } else { (2.0 / m).sqrt() };
                (0..num_filters)
                    .map(|n| {
                        scale * (std::f64::consts::PI * k as f64 * (n as f64 + 0.5) / m).cos()
                    })
                    .collect()
            })
            .collect();

        Ok(Self { basis })
    }

    pub fn num_coefficients(&self) -> usize {
        self.basis.len()
    }

    pub fn project(&self, energies: &[f64]) -> Vec<f64> {
        let log_energies: Vec<f64> = energies.iter().map(|&e| e.max(LOG_FLOOR).ln()).collect();
        self.basis
            .iter()
            .map(|row| row.iter().zip(&log_energies).map(|(c, e)| c * e).sum())
            .collect()
    }
}
