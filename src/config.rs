//! Device profile: calibration, layout, filter design and scale tables.
//!
//! The firmware this grew out of carried several near-identical pipelines
//! that differed only in these constants; here they are one profile
//! selected at startup.

use crate::display::PlotLayout;
use crate::dsp::calibration::Calibration;
use crate::dsp::filter::BiquadCoefficients;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_SAMPLE_COUNT: usize = 240;

pub fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pocketscope")
}

pub fn profile_path() -> PathBuf {
    config_dir().join("profile.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub calibration: Calibration,
    pub layout: PlotLayout,
    pub filter: BiquadCoefficients,
    /// Volts per division, ascending.
    pub vertical_scales: Vec<f32>,
    /// Milliseconds per division, ascending.
    pub horizontal_scales: Vec<f32>,
    /// Samples per acquisition; even, fixed for the life of the process.
    pub sample_count: usize,
    pub initial_vertical_index: usize,
    pub initial_horizontal_index: usize,
    pub report_recipient: String,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            layout: PlotLayout::default(),
            filter: BiquadCoefficients::default(),
            vertical_scales: vec![1.0, 2.0, 5.0, 10.0],
            horizontal_scales: vec![5.0, 10.0, 20.0, 50.0],
            sample_count: DEFAULT_SAMPLE_COUNT,
            initial_vertical_index: 1,
            initial_horizontal_index: 2,
            report_recipient: "scope@example.com".into(),
        }
    }
}

impl DeviceProfile {
    /// Restores the invariants a hand-edited profile can break: non-empty
    /// ascending tables, an even acquisition length, in-range indices.
    pub fn sanitize(&mut self) {
        let defaults = DeviceProfile::default();
        if self.vertical_scales.is_empty() {
            self.vertical_scales = defaults.vertical_scales;
        }
        if self.horizontal_scales.is_empty() {
            self.horizontal_scales = defaults.horizontal_scales;
        }
        self.vertical_scales.sort_by(|a, b| a.total_cmp(b));
        self.horizontal_scales.sort_by(|a, b| a.total_cmp(b));
        if self.sample_count == 0 || self.sample_count % 2 != 0 {
            self.sample_count = DEFAULT_SAMPLE_COUNT;
        }
        if self.layout.plot_high <= self.layout.plot_low || self.layout.divisions_vertical == 0 {
            self.layout = defaults.layout;
        }
        self.initial_vertical_index = self
            .initial_vertical_index
            .min(self.vertical_scales.len() - 1);
        self.initial_horizontal_index = self
            .initial_horizontal_index
            .min(self.horizontal_scales.len() - 1);
    }

    /// Loads a profile, tolerating a missing or malformed file.
    pub fn load_or_default(path: &Path) -> Self {
        let mut profile: DeviceProfile = fs::read_to_string(path)
            .ok()
            .and_then(|s| {
                serde_json::from_str(&s)
                    .map_err(|e| warn!("profile parse error {path:?}: {e}"))
                    .ok()
            })
            .unwrap_or_default();
        profile.sanitize();
        profile
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing profile to {}", path.display()))
    }

    /// Acquisition window for a horizontal scale index, in milliseconds.
    pub fn window_ms(&self, h_index: usize) -> f32 {
        self.horizontal_scales[h_index] * self.layout.divisions_horizontal as f32
    }

    /// Effective sample rate for a horizontal scale index.
    pub fn sample_rate(&self, h_index: usize) -> f32 {
        self.sample_count as f32 * 1000.0 / self.window_ms(h_index)
    }
}
