use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{Result, SpeakerIdError};

/// Power spectrum of real frames via a pre-planned forward FFT.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    /// Plans an FFT of `size` points. Only powers of two are supported.
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(SpeakerIdError::Transform(format!(
                "unsupported FFT length {} (must be a power of two >= 2)",
                size
            )));
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            size,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        })
    }

    /// Number of non-negative frequency bins, including Nyquist.
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Returns `|X[k]|²` for `k` in `0..=N/2`.
    pub fn power_spectrum(&mut self, frame: &[f64]) -> Result<Vec<f64>> {
        if frame.len() != self.size {
            return Err(SpeakerIdError::Transform(format!(
                "frame has {} samples, FFT is planned for {}",
                frame.len(),
                self.size
            )));
        }

        for (slot, &s) in self.buffer.iter_mut().zip(frame) {
            *slot = Complex::new(s, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        Ok(self.buffer[..self.num_bins()]
            .iter()
            .map(|c| c.norm_sqr())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_lengths() {
        assert!(matches!(
            SpectralAnalyzer::new(0),
            Err(SpeakerIdError::Transform(_))
        ));
        assert!(matches!(
            SpectralAnalyzer::new(1),
            Err(SpeakerIdError::Transform(_))
        ));
        assert!(matches!(
            SpectralAnalyzer::new(500),
            Err(SpeakerIdError::Transform(_))
        ));
    }

    #[test]
    fn rejects_wrong_frame_length() {
        let mut analyzer = SpectralAnalyzer::new(8).unwrap();
        assert!(matches!(
            analyzer.power_spectrum(&[0.0; 4]),
            Err(SpeakerIdError::Transform(_))
        ));
    }

    #[test]
    fn keeps_half_spectrum_plus_nyquist() {
        let mut analyzer = SpectralAnalyzer::new(512).unwrap();
        let spectrum = analyzer.power_spectrum(&[0.0; 512]).unwrap();
        assert_eq!(spectrum.len(), 257);
        assert!(spectrum.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn dc_signal_energy_in_bin_zero() {
        let mut analyzer = SpectralAnalyzer::new(8).unwrap();
        let spectrum = analyzer.power_spectrum(&[1.0; 8]).unwrap();
        assert!((spectrum[0] - 64.0).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|&p| p.abs() < 1e-9));
    }

    #[test]
    fn sine_peaks_at_expected_bin() {
        let sr = 44_100.0;
        let n = 512;
        let freq = 1_000.0;
        let frame: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sr).sin())
            .collect();
        let mut analyzer = SpectralAnalyzer::new(n).unwrap();
        let spectrum = analyzer.power_spectrum(&frame).unwrap();
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, (freq * n as f64 / sr).round() as usize);
    }
}
