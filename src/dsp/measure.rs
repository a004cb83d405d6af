//! Waveform statistics and mean-crossing period estimation.

use super::DspError;

/// Per-acquisition statistics, computed in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceStats {
    pub v_max: f32,
    pub v_min: f32,
    pub v_mean: f32,
    pub v_rms: f32,
}

pub fn trace_stats(trace: &[f32]) -> Result<TraceStats, DspError> {
    let &first = trace.first().ok_or(DspError::EmptyTrace)?;
    let (mut v_max, mut v_min) = (first, first);
    let (mut sum, mut sum_sq) = (0.0f32, 0.0f32);
    for &v in trace {
        v_max = v_max.max(v);
        v_min = v_min.min(v);
        sum += v;
        sum_sq += v * v;
    }
    let n = trace.len() as f32;
    Ok(TraceStats {
        v_max,
        v_min,
        v_mean: sum / n,
        v_rms: (sum_sq / n).sqrt(),
    })
}

/// Whether a sample sits strictly inside the ±10% band around the mean.
/// The comparison is direction-aware so a negative mean keeps its
/// ordering.
#[inline]
fn near_mean(v: f32, mean: f32) -> bool {
    if mean >= 0.0 {
        v > 0.9 * mean && v < 1.1 * mean
    } else {
        v < 0.9 * mean && v > 1.1 * mean
    }
}

/// Estimates the waveform period in samples from the spacing of near-mean
/// runs. Each maximal run contributes the index of its first sample; the
/// scan then advances to one past the last sample of the run. Spacings
/// between consecutive run starts approximate half-periods and are
/// averaged, leaving out the wrap-around gap between last and first.
pub fn estimate_period(trace: &[f32], mean: f32) -> Result<f32, DspError> {
    if trace.is_empty() {
        return Err(DspError::EmptyTrace);
    }
    let mut run_starts: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < trace.len() {
        if near_mean(trace[i], mean) {
            run_starts.push(i);
            while i < trace.len() && near_mean(trace[i], mean) {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    if run_starts.len() < 2 {
        return Err(DspError::NoPeriod);
    }
    let spacings = run_starts.len() - 1;
    let half_period = (run_starts[spacings] - run_starts[0]) as f32 / spacings as f32;
    Ok(2.0 * half_period)
}

/// Converts a period in samples to seconds given the acquisition interval.
#[inline]
pub fn period_seconds(period_samples: f32, sample_interval_s: f32) -> f32 {
    period_samples * sample_interval_s
}
