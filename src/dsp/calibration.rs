//! Raw ADC code to probe voltage conversion.

use serde::{Deserialize, Serialize};

/// Empirical transfer constants for one device, measured off-line. The
/// panel defines a non-zero input level as 0 V and the probe sits behind
/// a resistive divider, so both are undone here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Volts per ADC code.
    pub gain: f32,
    /// ADC intercept in volts.
    pub offset: f32,
    /// Input level the panel treats as 0 V.
    pub reference_volts: f32,
    /// Front-end divider ratio; measured voltage is divided by it.
    pub divider_ratio: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            gain: 0.000_440_28,
            offset: 0.091_455,
            reference_volts: 1.0,
            divider_ratio: 1.0 / 29.3,
        }
    }
}

impl Calibration {
    /// Converts one raw code to the voltage at the probe. Affine and
    /// stateless per sample; any code yields a finite voltage.
    #[inline]
    pub fn convert(&self, raw: u16) -> f32 {
        (raw as f32 * self.gain + self.offset - self.reference_volts) / self.divider_ratio
    }

    pub fn convert_block(&self, block: &[u16]) -> Vec<f32> {
        block.iter().map(|&raw| self.convert(raw)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_for_positive_gain() {
        let cal = Calibration::default();
        let mut previous = cal.convert(0);
        for raw in 1..4096u16 {
            let v = cal.convert(raw);
            assert!(v > previous, "calibration not monotonic at code {raw}");
            previous = v;
        }
    }

    #[test]
    fn undoes_reference_and_divider() {
        let cal = Calibration {
            gain: 0.001,
            offset: 0.0,
            reference_volts: 1.0,
            divider_ratio: 0.5,
        };
        // 1 V at the ADC is the reference level, so the probe saw 0 V.
        assert!((cal.convert(1000)).abs() < 1e-6);
        // 2 V at the ADC is 1 V above reference, doubled by the divider.
        assert!((cal.convert(2000) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn block_conversion_is_index_aligned() {
        let cal = Calibration::default();
        let block = [0u16, 2048, 4095];
        let trace = cal.convert_block(&block);
        assert_eq!(trace.len(), block.len());
        for (raw, v) in block.iter().zip(&trace) {
            assert_eq!(*v, cal.convert(*raw));
        }
    }
}
