//! Numeric core: calibration, spectral analysis, filtering, measurement
//! and autoscale. Everything here is pure with respect to device state;
//! acquisition and drawing live behind the `hw` traits.

pub mod autoscale;
pub mod calibration;
pub mod filter;
pub mod measure;
pub mod spectrum;

use thiserror::Error;

/// Conditions the numeric core reports instead of producing NaN or
/// undefined output. None of them is fatal to the command loop.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DspError {
    #[error("empty trace")]
    EmptyTrace,
    #[error("trace length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("no period detected: fewer than two mean-crossing runs")]
    NoPeriod,
}
