//! Trace and spectrum projection to pixel coordinates under the active
//! scale settings.

use super::{PixelPoint, PlotLayout};

/// Whether the terminal (Nyquist) spectrum bin is drawn. It carries a
/// different amplitude correction from the interior bins, so the stock
/// firmware leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NyquistBin {
    #[default]
    Omit,
    Include,
}

/// One point per sample, centred on the zero-volt row. Every row is
/// clamped into the plot band.
pub fn map_waveform(trace: &[f32], volts_per_div: f32, layout: &PlotLayout) -> Vec<PixelPoint> {
    let rows_per_volt = layout.plot_rows() / (layout.divisions_vertical as f32 * volts_per_div);
    let center = layout.center_row();
    trace
        .iter()
        .enumerate()
        .map(|(n, &v)| PixelPoint {
            x: n as i32,
            y: layout.clamp_row(center + rows_per_volt * v),
        })
        .collect()
}

/// Two x-adjacent points per bin for the stepped bar look, anchored at
/// the lower edge of the plot band. Spectral full scale is half the
/// waveform volts-per-division.
pub fn map_spectrum(
    spectrum: &[f32],
    volts_per_div: f32,
    layout: &PlotLayout,
    nyquist: NyquistBin,
) -> Vec<PixelPoint> {
    let rows_per_unit =
        layout.plot_rows() / (layout.divisions_vertical as f32 * volts_per_div * 0.5);
    let bins = match nyquist {
        NyquistBin::Include => spectrum.len(),
        NyquistBin::Omit => spectrum.len().saturating_sub(1),
    };
    let mut points = Vec::with_capacity(bins * 2);
    for (k, &magnitude) in spectrum.iter().take(bins).enumerate() {
        let y = layout.clamp_row(layout.plot_low as f32 + rows_per_unit * magnitude);
        points.push(PixelPoint { x: 2 * k as i32, y });
        points.push(PixelPoint {
            x: 2 * k as i32 + 1,
            y,
        });
    }
    points
}
