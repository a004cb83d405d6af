//! Pixel-space layout and coordinate mapping for the fixed-size panel.

pub mod mapper;

use serde::{Deserialize, Serialize};

/// One point in panel coordinates. Rows follow the panel convention
/// (origin bottom-left, y grows upward).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

/// Geometry of the plot band on the panel. The strip outside
/// `plot_low..=plot_high` carries the scale labels and status icon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotLayout {
    pub width: u32,
    pub height: u32,
    pub plot_low: i32,
    pub plot_high: i32,
    pub divisions_horizontal: u32,
    pub divisions_vertical: u32,
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self {
            width: 240,
            height: 135,
            plot_low: 16,
            plot_high: 135,
            divisions_horizontal: 10,
            divisions_vertical: 6,
        }
    }
}

impl PlotLayout {
    /// Height of the plot band in rows.
    pub fn plot_rows(&self) -> f32 {
        (self.plot_high - self.plot_low) as f32
    }

    /// Row representing 0 V in waveform mode.
    pub fn center_row(&self) -> f32 {
        (self.plot_low + self.plot_high) as f32 / 2.0
    }

    /// Rounds and clips a row into the plot band. Out-of-range values
    /// clip rather than reject.
    pub fn clamp_row(&self, row: f32) -> i32 {
        (row.round() as i32).clamp(self.plot_low, self.plot_high)
    }
}
