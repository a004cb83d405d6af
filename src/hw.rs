//! Boundary with the device collaborators: acquisition, panel drawing,
//! mail and the button interface. The core supplies numbers and text;
//! everything behind these traits is external.

pub mod sim;

use crate::display::PixelPoint;
use anyhow::Result;

/// Palette entries the scope draws with; the panel owns the actual RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Grey1,
    Grey2,
    Yellow,
    Magenta,
    Cyan,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Arial16,
}

pub trait SampleSource {
    /// Blocks until `sample_count` raw ADC codes spanning `window_ms`
    /// have been captured.
    fn acquire(&mut self, sample_count: usize, window_ms: f32) -> Result<Vec<u16>>;
}

pub trait Panel {
    fn clear(&mut self, color: Color) -> Result<()>;
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()>;
    fn status_icon(&mut self, x: i32, y: i32) -> Result<()>;
    fn text(&mut self, font: Font, s: &str, x: i32, y: i32, color: Color) -> Result<()>;
    fn polyline(&mut self, color: Color, points: &[PixelPoint]) -> Result<()>;
}

pub trait Mailer {
    fn send(
        &mut self,
        sample_interval_s: f32,
        trace: &[f32],
        body: &str,
        recipient: &str,
    ) -> Result<()>;
}

/// Button event sentinel meaning "nothing pressed".
pub const NO_EVENT: u8 = 0;

/// Commands the scope responds to. Button codes follow the panel firmware
/// convention: tens digit is the physical button, ones digit the gesture
/// (1 click, 2 long-press, 3 double-click).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ShowWaveform,
    SendReport,
    ShowFiltered,
    NextVerticalScale,
    NextHorizontalScale,
    ShowSpectrum,
    Autoscale,
    ShowMeasurements,
}

impl Command {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            11 => Some(Self::ShowWaveform),
            12 => Some(Self::SendReport),
            13 => Some(Self::ShowFiltered),
            21 => Some(Self::NextVerticalScale),
            22 => Some(Self::NextHorizontalScale),
            23 => Some(Self::ShowSpectrum),
            31 => Some(Self::Autoscale),
            33 => Some(Self::ShowMeasurements),
            _ => None,
        }
    }
}
