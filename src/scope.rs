//! Command dispatch and scale-selection state.
//!
//! One command is processed at a time: acquire, compute, render, return.
//! Scale indices are committed only after the command's acquisition and
//! render succeed, so a collaborator failure leaves the previous settings
//! and the last good trace intact.

use crate::config::DeviceProfile;
use crate::display::PixelPoint;
use crate::display::mapper::{self, NyquistBin};
use crate::dsp::DspError;
use crate::dsp::autoscale;
use crate::dsp::calibration::Calibration;
use crate::dsp::filter::BandPassFilter;
use crate::dsp::measure::{self, TraceStats};
use crate::dsp::spectrum::{self, SpectrumAnalyzer};
use crate::hw::{Color, Command, Font, Mailer, Panel, SampleSource};
use anyhow::{Context, Result};
use tracing::{debug, info};

pub struct Scope<S, P, M> {
    profile: DeviceProfile,
    calibration: Calibration,
    filter: BandPassFilter,
    analyzer: SpectrumAnalyzer,
    nyquist_bin: NyquistBin,
    v_index: usize,
    h_index: usize,
    last_trace: Vec<f32>,
    last_stats: Option<TraceStats>,
    source: S,
    panel: P,
    mailer: M,
}

impl<S: SampleSource, P: Panel, M: Mailer> Scope<S, P, M> {
    pub fn new(profile: DeviceProfile, source: S, panel: P, mailer: M) -> Self {
        Self {
            calibration: profile.calibration,
            filter: BandPassFilter::new(profile.filter),
            analyzer: SpectrumAnalyzer::new(profile.sample_count),
            nyquist_bin: NyquistBin::default(),
            v_index: profile.initial_vertical_index,
            h_index: profile.initial_horizontal_index,
            last_trace: Vec::new(),
            last_stats: None,
            profile,
            source,
            panel,
            mailer,
        }
    }

    pub fn scale_indices(&self) -> (usize, usize) {
        (self.v_index, self.h_index)
    }

    pub fn last_stats(&self) -> Option<TraceStats> {
        self.last_stats
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        debug!(?command, "dispatch");
        match command {
            Command::ShowWaveform => self.show_waveform(self.v_index, self.h_index),
            Command::SendReport => self.send_report(),
            Command::ShowFiltered => self.show_filtered(),
            Command::NextVerticalScale => {
                let v = (self.v_index + 1) % self.profile.vertical_scales.len();
                self.show_waveform(v, self.h_index)?;
                self.v_index = v;
                Ok(())
            }
            Command::NextHorizontalScale => {
                let h = (self.h_index + 1) % self.profile.horizontal_scales.len();
                self.show_waveform(self.v_index, h)?;
                self.h_index = h;
                Ok(())
            }
            Command::ShowSpectrum => self.show_spectrum(),
            Command::Autoscale => self.autoscale(),
            Command::ShowMeasurements => self.show_measurements(),
        }
    }

    /// Acquires one block under the given horizontal scale and calibrates
    /// it. The cached trace is only replaced on success.
    fn capture(&mut self, h_index: usize) -> Result<TraceStats> {
        let window_ms = self.profile.window_ms(h_index);
        let block = self
            .source
            .acquire(self.profile.sample_count, window_ms)
            .context("acquisition failed")?;
        let trace = self.calibration.convert_block(&block);
        let stats = measure::trace_stats(&trace)?;
        self.last_stats = Some(stats);
        self.last_trace = trace;
        Ok(stats)
    }

    fn render_frame(
        &mut self,
        points: &[PixelPoint],
        line: Color,
        left_label: &str,
        right_label: &str,
        grid_line: Color,
    ) -> Result<()> {
        let l = self.profile.layout;
        self.panel.clear(Color::Black)?;
        self.panel.grid(
            0,
            l.plot_low,
            l.width,
            (l.plot_high - l.plot_low) as u32,
            l.divisions_horizontal,
            l.divisions_vertical,
            grid_line,
            Color::Grey1,
        )?;
        self.panel.status_icon(l.width as i32 - 16, 0)?;
        self.panel.text(Font::Arial16, left_label, 0, 0, Color::White)?;
        self.panel.text(Font::Arial16, right_label, 90, 0, Color::White)?;
        self.panel.polyline(line, points)
    }

    fn show_waveform(&mut self, v_index: usize, h_index: usize) -> Result<()> {
        self.capture(h_index)?;
        let volts_per_div = self.profile.vertical_scales[v_index];
        let points = mapper::map_waveform(&self.last_trace, volts_per_div, &self.profile.layout);
        self.render_frame(
            &points,
            Color::Yellow,
            &format!("{volts_per_div} V/div"),
            &format!("{} ms/div", self.profile.horizontal_scales[h_index]),
            Color::Grey2,
        )
    }

    fn show_filtered(&mut self) -> Result<()> {
        self.capture(self.h_index)?;
        let filtered = self.filter.apply(&self.last_trace)?;
        // Display-local vertical fit; the stored scale index is untouched.
        let v = autoscale::pick_vertical_scale(&filtered, &self.profile.vertical_scales);
        let volts_per_div = self.profile.vertical_scales[v];
        let points = mapper::map_waveform(&filtered, volts_per_div, &self.profile.layout);
        self.render_frame(
            &points,
            Color::Yellow,
            &format!("{volts_per_div} V/div"),
            &format!("{} ms/div", self.profile.horizontal_scales[self.h_index]),
            Color::Grey2,
        )
    }

    fn show_spectrum(&mut self) -> Result<()> {
        if self.last_trace.is_empty() {
            self.capture(self.h_index)?;
        }
        let spectrum = self.analyzer.analyze(&self.last_trace)?;
        let sample_rate = self.profile.sample_rate(self.h_index);
        if let Some((k, magnitude)) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
        {
            debug!(
                peak_hz = self.analyzer.bin_hz(k, sample_rate),
                magnitude, "spectrum peak"
            );
        }
        let volts_per_div = self.profile.vertical_scales[self.v_index];
        let points = mapper::map_spectrum(
            &spectrum,
            volts_per_div,
            &self.profile.layout,
            self.nyquist_bin,
        );
        self.render_frame(
            &points,
            Color::Magenta,
            &format!("{} Hz/div", spectrum::hz_per_division(sample_rate)),
            &format!("{} V/div", volts_per_div * 0.5),
            Color::Black,
        )
    }

    fn send_report(&mut self) -> Result<()> {
        if self.last_trace.is_empty() {
            self.capture(self.h_index)?;
        }
        let stats = self
            .last_stats
            .ok_or_else(|| anyhow::anyhow!("no statistics available"))?;
        let window_s = self.profile.window_ms(self.h_index) / 1000.0;
        let body = report_body(self.last_trace.len(), window_s, &stats);
        let sample_interval = window_s / self.last_trace.len() as f32;
        self.mailer.send(
            sample_interval,
            &self.last_trace,
            &body,
            &self.profile.report_recipient,
        )
    }

    fn show_measurements(&mut self) -> Result<()> {
        let stats = self.capture(self.h_index)?;
        let period_ms = self.period_ms(stats.v_mean);
        self.panel.clear(Color::Black)?;
        self.panel
            .text(Font::Arial16, "Measurements", 70, 90, Color::Cyan)?;
        let period_label = match period_ms {
            Some(ms) => format!("T = {ms:.2} ms"),
            None => "T = --".to_string(),
        };
        self.panel
            .text(Font::Arial16, &period_label, 5, 30, Color::White)?;
        self.panel.text(
            Font::Arial16,
            &format!("Min: {:.2} V", stats.v_min),
            5,
            50,
            Color::White,
        )?;
        self.panel.text(
            Font::Arial16,
            &format!("Max: {:.2} V", stats.v_max),
            130,
            50,
            Color::White,
        )?;
        self.panel.text(
            Font::Arial16,
            &format!("Mean: {:.2} V", stats.v_mean),
            5,
            70,
            Color::White,
        )?;
        self.panel.text(
            Font::Arial16,
            &format!("RMS: {:.2} V", stats.v_rms),
            130,
            70,
            Color::White,
        )
    }

    fn autoscale(&mut self) -> Result<()> {
        let stats = self.capture(self.h_index)?;
        let v = autoscale::pick_vertical_scale(&self.last_trace, &self.profile.vertical_scales);
        let h = match self.period_ms(stats.v_mean) {
            Some(period_ms) => {
                autoscale::pick_horizontal_scale(&self.profile.horizontal_scales, period_ms)
            }
            None => {
                info!("no period detected, keeping the horizontal scale");
                self.h_index
            }
        };
        self.show_waveform(v, h)?;
        self.v_index = v;
        self.h_index = h;
        Ok(())
    }

    /// Period of the cached trace in milliseconds, if one is detectable.
    fn period_ms(&self, mean: f32) -> Option<f32> {
        let window_s = self.profile.window_ms(self.h_index) / 1000.0;
        let sample_interval = window_s / self.last_trace.len() as f32;
        match measure::estimate_period(&self.last_trace, mean) {
            Ok(samples) => Some(measure::period_seconds(samples, sample_interval) * 1000.0),
            Err(DspError::NoPeriod) => None,
            Err(err) => {
                debug!(%err, "period estimation failed");
                None
            }
        }
    }
}

/// Fixed-format mail payload.
fn report_body(points: usize, window_s: f32, stats: &TraceStats) -> String {
    format!(
        "List of {points} points in {window_s:.2} seconds.\n Vmax = {:.3}V \t\t Vmin = {:.3}V \n Vmean = {:.3}V \t\t Vrms = {:.3}V\n",
        stats.v_max, stats.v_min, stats.v_mean, stats.v_rms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::f32::consts::TAU;
    use std::rc::Rc;

    /// Identity calibration so raw codes map directly to millivolts.
    fn flat_calibration() -> Calibration {
        Calibration {
            gain: 0.001,
            offset: 0.0,
            reference_volts: 0.0,
            divider_ratio: 1.0,
        }
    }

    fn test_profile() -> DeviceProfile {
        DeviceProfile {
            calibration: flat_calibration(),
            ..DeviceProfile::default()
        }
    }

    struct FixedSource {
        block: Vec<u16>,
    }

    impl SampleSource for FixedSource {
        fn acquire(&mut self, sample_count: usize, _window_ms: f32) -> Result<Vec<u16>> {
            assert_eq!(self.block.len(), sample_count);
            Ok(self.block.clone())
        }
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn acquire(&mut self, _sample_count: usize, _window_ms: f32) -> Result<Vec<u16>> {
            Err(anyhow!("adc timeout"))
        }
    }

    #[derive(Default, Clone)]
    struct Recorded {
        polylines: Vec<(Color, Vec<PixelPoint>)>,
        labels: Vec<String>,
        clears: usize,
    }

    #[derive(Default, Clone)]
    struct RecordingPanel {
        seen: Rc<RefCell<Recorded>>,
    }

    impl Panel for RecordingPanel {
        fn clear(&mut self, _color: Color) -> Result<()> {
            self.seen.borrow_mut().clears += 1;
            Ok(())
        }
        fn grid(
            &mut self,
            _x: i32,
            _y: i32,
            _width: u32,
            _height: u32,
            _dx: u32,
            _dy: u32,
            _line: Color,
            _axis: Color,
        ) -> Result<()> {
            Ok(())
        }
        fn status_icon(&mut self, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }
        fn text(&mut self, _font: Font, s: &str, _x: i32, _y: i32, _color: Color) -> Result<()> {
            self.seen.borrow_mut().labels.push(s.to_string());
            Ok(())
        }
        fn polyline(&mut self, color: Color, points: &[PixelPoint]) -> Result<()> {
            self.seen
                .borrow_mut()
                .polylines
                .push((color, points.to_vec()));
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingMailer {
        sent: Rc<RefCell<Vec<(f32, usize, String, String)>>>,
    }

    impl Mailer for RecordingMailer {
        fn send(
            &mut self,
            sample_interval_s: f32,
            trace: &[f32],
            body: &str,
            recipient: &str,
        ) -> Result<()> {
            self.sent.borrow_mut().push((
                sample_interval_s,
                trace.len(),
                body.to_string(),
                recipient.to_string(),
            ));
            Ok(())
        }
    }

    fn scope_with_block(
        block: Vec<u16>,
    ) -> (
        Scope<FixedSource, RecordingPanel, RecordingMailer>,
        Rc<RefCell<Recorded>>,
        Rc<RefCell<Vec<(f32, usize, String, String)>>>,
    ) {
        let panel = RecordingPanel::default();
        let mailer = RecordingMailer::default();
        let seen = panel.seen.clone();
        let sent = mailer.sent.clone();
        let scope = Scope::new(test_profile(), FixedSource { block }, panel, mailer);
        (scope, seen, sent)
    }

    fn sine_block(amplitude_mv: f32, cycles: f32) -> Vec<u16> {
        (0..240)
            .map(|n| {
                let v = amplitude_mv * (TAU * cycles * n as f32 / 240.0).sin();
                (2000.0 + v) as u16
            })
            .collect()
    }

    #[test]
    fn vertical_scale_wraps_around_the_table() {
        let (mut scope, _, _) = scope_with_block(vec![0; 240]);
        let start = scope.scale_indices().0;
        for _ in 0..4 {
            scope.handle(Command::NextVerticalScale).unwrap();
        }
        assert_eq!(scope.scale_indices().0, start);
    }

    #[test]
    fn zero_trace_renders_a_flat_centred_line() {
        let (mut scope, seen, _) = scope_with_block(vec![0; 240]);
        scope.handle(Command::ShowWaveform).unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.clears, 1);
        let (color, points) = &seen.polylines[0];
        assert_eq!(*color, Color::Yellow);
        assert_eq!(points.len(), 240);
        let center = test_profile().layout.clamp_row(test_profile().layout.center_row());
        assert!(points.iter().all(|p| p.y == center));
        let stats = scope.last_stats().unwrap();
        assert_eq!(stats.v_max, 0.0);
        assert_eq!(stats.v_rms, 0.0);
    }

    #[test]
    fn report_body_carries_the_statistics() {
        let (mut scope, _, sent) = scope_with_block(vec![0; 240]);
        scope.handle(Command::SendReport).unwrap();
        let sent = sent.borrow();
        let (interval, points, body, recipient) = &sent[0];
        assert_eq!(*points, 240);
        assert_eq!(recipient, "scope@example.com");
        assert!((interval - 0.2 / 240.0).abs() < 1e-7);
        assert!(body.contains("List of 240 points in 0.20 seconds."));
        assert!(body.contains("Vmax = 0.000V"));
        assert!(body.contains("Vrms = 0.000V"));
    }

    #[test]
    fn spectrum_doubles_bins_and_omits_nyquist() {
        let (mut scope, seen, _) = scope_with_block(sine_block(500.0, 10.0));
        scope.handle(Command::ShowSpectrum).unwrap();
        let seen = seen.borrow();
        let (color, points) = &seen.polylines[0];
        assert_eq!(*color, Color::Magenta);
        assert_eq!(points.len(), 2 * (240 / 2 + 1 - 1));
        assert!(seen.labels.iter().any(|l| l.ends_with("Hz/div")));
    }

    #[test]
    fn autoscale_keeps_horizontal_scale_without_a_period() {
        // Constant trace: a single near-mean run, so no period.
        let (mut scope, _, _) = scope_with_block(vec![2000; 240]);
        let (_, h_before) = scope.scale_indices();
        scope.handle(Command::Autoscale).unwrap();
        let (v_after, h_after) = scope.scale_indices();
        assert_eq!(h_after, h_before);
        // 2 V peak fits the finest vertical scale with 3 divisions of room.
        assert_eq!(v_after, 0);
    }

    #[test]
    fn autoscale_fits_amplitude_and_period() {
        // 1.5 V offset, 1 V amplitude, 12 cycles in 200 ms: period 16.7 ms.
        let block: Vec<u16> = (0..240)
            .map(|n| (1500.0 + 1000.0 * (TAU * 12.0 * n as f32 / 240.0).sin()) as u16)
            .collect();
        let (mut scope, _, _) = scope_with_block(block);
        scope.handle(Command::Autoscale).unwrap();
        let (v, h) = scope.scale_indices();
        // Peak 2.5 V fits 1 V/div; two periods (33 ms) fit 5 ms/div x 10.
        assert_eq!(v, 0);
        assert_eq!(h, 0);
    }

    #[test]
    fn failed_acquisition_preserves_state() {
        let panel = RecordingPanel::default();
        let mut scope = Scope::new(
            test_profile(),
            FailingSource,
            panel,
            RecordingMailer::default(),
        );
        let before = scope.scale_indices();
        assert!(scope.handle(Command::NextVerticalScale).is_err());
        assert!(scope.handle(Command::Autoscale).is_err());
        assert_eq!(scope.scale_indices(), before);
        assert!(scope.last_stats().is_none());
    }

    #[test]
    fn filtered_display_does_not_commit_the_vertical_scale() {
        let (mut scope, seen, _) = scope_with_block(sine_block(800.0, 10.0));
        let before = scope.scale_indices();
        scope.handle(Command::ShowFiltered).unwrap();
        assert_eq!(scope.scale_indices(), before);
        assert_eq!(seen.borrow().polylines[0].1.len(), 240);
    }

    #[test]
    fn measurements_screen_reports_a_period() {
        let (mut scope, seen, _) = scope_with_block(sine_block(500.0, 12.0));
        scope.handle(Command::ShowMeasurements).unwrap();
        let seen = seen.borrow();
        let period = seen
            .labels
            .iter()
            .find(|l| l.starts_with("T = "))
            .expect("period label missing");
        // 12 cycles in 200 ms is a 16.67 ms period.
        let ms: f32 = period
            .trim_start_matches("T = ")
            .trim_end_matches(" ms")
            .parse()
            .unwrap();
        assert!((ms - 16.67).abs() < 0.5, "{period}");
    }
}
