//! One-sided magnitude spectrum of a fixed-length trace.

use super::DspError;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex32;
use std::sync::Arc;

/// Hz-per-division label table for the spectrum screen, coarse to fine.
const HZ_PER_DIVISION: [f32; 4] = [240.0, 120.0, 60.0, 24.0];

pub struct SpectrumAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    size: usize,
    buf: Vec<f32>,
    out: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl SpectrumAnalyzer {
    /// `size` is the fixed acquisition length; must be even and non-zero
    /// so the Nyquist bin exists.
    pub fn new(size: usize) -> Self {
        assert!(
            size > 0 && size % 2 == 0,
            "acquisition length must be even and non-zero"
        );
        let fft = RealFftPlanner::new().plan_fft_forward(size);
        Self {
            scratch: vec![Complex32::default(); fft.get_scratch_len()],
            buf: vec![0.0; size],
            out: vec![Complex32::default(); size / 2 + 1],
            size,
            fft,
        }
    }

    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Frequency of bin `k` at the given sample rate.
    pub fn bin_hz(&self, k: usize, sample_rate: f32) -> f32 {
        k as f32 * sample_rate / self.size as f32
    }

    /// Magnitudes for bins 0..=N/2. Interior bins carry the x2 one-sided
    /// amplitude correction; DC and Nyquist carry x1.
    pub fn analyze(&mut self, trace: &[f32]) -> Result<Vec<f32>, DspError> {
        if trace.len() != self.size {
            return Err(DspError::LengthMismatch {
                expected: self.size,
                actual: trace.len(),
            });
        }
        self.buf.copy_from_slice(trace);
        self.out.fill(Complex32::default());
        self.fft
            .process_with_scratch(&mut self.buf, &mut self.out, &mut self.scratch)
            .map_err(|_| DspError::LengthMismatch {
                expected: self.size,
                actual: trace.len(),
            })?;
        let n = self.size as f32;
        let last = self.out.len() - 1;
        Ok(self
            .out
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let correction = if k == 0 || k == last { 1.0 } else { 2.0 };
                correction * c.norm() / n
            })
            .collect())
    }
}

/// Smallest label from the fixed Hz/div table that still fits ten
/// divisions under Nyquist; falls back to the finest entry.
pub fn hz_per_division(sample_rate: f32) -> f32 {
    let f_max = sample_rate / 2.0;
    HZ_PER_DIVISION
        .iter()
        .copied()
        .find(|&f| f <= f_max / 10.0)
        .unwrap_or(HZ_PER_DIVISION[HZ_PER_DIVISION.len() - 1])
}
