//! Fixed-coefficient second-order recursive band-pass filter.

use super::DspError;
use serde::{Deserialize, Serialize};

/// Normalized (a0 = 1) biquad coefficient set. Designed off-line; the
/// device never recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoefficients {
    /// Band-pass centred at 100 Hz with 50 Hz bandwidth: first-order
    /// Chebyshev prototype (3 dB ripple), lp-to-bp transformed and
    /// bilinear-discretized at the 4800 Hz design rate.
    fn default() -> Self {
        Self {
            b0: 0.031_629_689,
            b1: 0.0,
            b2: -0.031_629_689,
            a1: -1.920_218_6,
            a2: 0.936_740_6,
        }
    }
}

pub struct BandPassFilter {
    coeffs: BiquadCoefficients,
}

impl BandPassFilter {
    pub fn new(coeffs: BiquadCoefficients) -> Self {
        Self { coeffs }
    }

    /// Runs one pass over a trace. History registers are seeded with the
    /// first sample so a DC-offset input does not ring at startup. Holds
    /// no state between invocations; output length equals input length.
    pub fn apply(&self, trace: &[f32]) -> Result<Vec<f32>, DspError> {
        let &first = trace.first().ok_or(DspError::EmptyTrace)?;
        let c = self.coeffs;
        let (mut x1, mut x2) = (first, first);
        let (mut y1, mut y2) = (first, first);
        let mut out = Vec::with_capacity(trace.len());
        for &x in trace {
            let y = c.b0 * x + c.b1 * x1 + c.b2 * x2 - c.a1 * y1 - c.a2 * y2;
            x2 = x1;
            x1 = x;
            y2 = y1;
            y1 = y;
            out.push(y);
        }
        Ok(out)
    }
}
