//! Host-side collaborator stand-ins for running without the device.

use super::{Color, Font, Mailer, Panel, SampleSource};
use crate::display::PixelPoint;
use crate::dsp::calibration::Calibration;
use anyhow::Result;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Synthesizes a sine at the probe and pushes it back through the inverse
/// calibration, standing in for the ADC.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    calibration: Calibration,
    pub amplitude_volts: f32,
    pub frequency_hz: f32,
    pub offset_volts: f32,
}

impl SyntheticSource {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            amplitude_volts: 2.0,
            frequency_hz: 50.0,
            offset_volts: 0.0,
        }
    }

    fn to_raw(&self, volts: f32) -> u16 {
        let code = (volts * self.calibration.divider_ratio + self.calibration.reference_volts
            - self.calibration.offset)
            / self.calibration.gain;
        code.round().clamp(0.0, 4095.0) as u16
    }
}

impl SampleSource for SyntheticSource {
    fn acquire(&mut self, sample_count: usize, window_ms: f32) -> Result<Vec<u16>> {
        let dt = window_ms / 1000.0 / sample_count as f32;
        Ok((0..sample_count)
            .map(|n| {
                let t = n as f32 * dt;
                self.to_raw(
                    self.offset_volts + self.amplitude_volts * (TAU * self.frequency_hz * t).sin(),
                )
            })
            .collect())
    }
}

/// Logs draw commands instead of driving a panel.
#[derive(Debug, Default)]
pub struct LogPanel;

impl Panel for LogPanel {
    fn clear(&mut self, color: Color) -> Result<()> {
        debug!(?color, "panel clear");
        Ok(())
    }

    fn grid(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        divisions_x: u32,
        divisions_y: u32,
        line: Color,
        axis: Color,
    ) -> Result<()> {
        debug!(x, y, width, height, divisions_x, divisions_y, ?line, ?axis, "panel grid");
        Ok(())
    }

    fn status_icon(&mut self, x: i32, y: i32) -> Result<()> {
        debug!(x, y, "status icon");
        Ok(())
    }

    fn text(&mut self, _font: Font, s: &str, x: i32, y: i32, color: Color) -> Result<()> {
        info!(x, y, ?color, "label: {s}");
        Ok(())
    }

    fn polyline(&mut self, color: Color, points: &[PixelPoint]) -> Result<()> {
        info!(?color, points = points.len(), "polyline");
        Ok(())
    }
}

/// Logs the report instead of mailing it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(
        &mut self,
        sample_interval_s: f32,
        trace: &[f32],
        body: &str,
        recipient: &str,
    ) -> Result<()> {
        info!(
            recipient,
            sample_interval_s,
            points = trace.len(),
            "mail:\n{body}"
        );
        Ok(())
    }
}
