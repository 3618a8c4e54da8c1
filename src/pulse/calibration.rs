//! Frequency ↔ control-amplitude calibration curves.
//!
//! The pulse generator never owns a calibration: callers pass a reference to
//! anything implementing `CalibrationCurve`, and the resulting `Waveform`
//! borrows it for its queries.

use crate::error::{CalibError, Result};
use crate::math::{Fill, Interp1d};

/// Device-specific bidirectional mapping between drive frequency and control
/// amplitude. Implementations must be monotonic so the two directions are
/// inverses of each other.
pub trait CalibrationCurve: Send + Sync {
    fn frequency_to_amplitude(&self, frequency: f64) -> f64;
    fn amplitude_to_frequency(&self, amplitude: f64) -> f64;
}

/// `frequency = zero_frequency + slope * amplitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    zero_frequency: f64,
    slope: f64,
}

impl LinearCalibration {
    pub fn new(zero_frequency: f64, slope: f64) -> Result<Self> {
        if !zero_frequency.is_finite() {
            return Err(CalibError::invalid("calibration zero frequency must be finite"));
        }
        if !(slope.is_finite() && slope != 0.0) {
            return Err(CalibError::invalid(format!(
                "calibration slope must be finite and non-zero, got {slope}"
            )));
        }
        Ok(Self { zero_frequency, slope })
    }
}

impl CalibrationCurve for LinearCalibration {
    fn frequency_to_amplitude(&self, frequency: f64) -> f64 {
        (frequency - self.zero_frequency) / self.slope
    }

    fn amplitude_to_frequency(&self, amplitude: f64) -> f64 {
        self.zero_frequency + self.slope * amplitude
    }
}

/// A measured `(amplitude, frequency)` table, linearly interpolated both ways.
///
/// Queries outside the table saturate at the nearest edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedCalibration {
    to_frequency: Interp1d,
    to_amplitude: Interp1d,
}

impl TabulatedCalibration {
    /// Build from unordered `(amplitude, frequency)` points. Frequencies must be
    /// strictly monotonic in amplitude.
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.len() < 2 {
            return Err(CalibError::InsufficientData {
                required: 2,
                provided: points.len(),
            });
        }
        if points.iter().any(|(a, f)| !(a.is_finite() && f.is_finite())) {
            return Err(CalibError::invalid("calibration table contains non-finite values"));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let amps: Vec<f64> = points.iter().map(|p| p.0).collect();
        let freqs: Vec<f64> = points.iter().map(|p| p.1).collect();
        let to_frequency = Interp1d::new(amps.clone(), freqs.clone(), Fill::Boundary)
            .ok_or_else(|| CalibError::invalid("calibration amplitudes must be distinct"))?;

        // The inverse needs frequencies increasing; flip if the curve decreases.
        let (inv_x, inv_y) = if freqs[1] < freqs[0] {
            (freqs.into_iter().rev().collect(), amps.into_iter().rev().collect())
        } else {
            (freqs, amps)
        };
        let to_amplitude = Interp1d::new(inv_x, inv_y, Fill::Boundary)
            .ok_or_else(|| CalibError::invalid("calibration frequencies must be strictly monotonic"))?;

        Ok(Self {
            to_frequency,
            to_amplitude,
        })
    }
}

impl CalibrationCurve for TabulatedCalibration {
    fn frequency_to_amplitude(&self, frequency: f64) -> f64 {
        self.to_amplitude.eval(frequency)
    }

    fn amplitude_to_frequency(&self, amplitude: f64) -> f64 {
        self.to_frequency.eval(amplitude)
    }
}

/// A calibration given as a pair of closures.
pub struct FnCalibration<F, G> {
    to_amplitude: F,
    to_frequency: G,
}

impl<F, G> FnCalibration<F, G>
where
    F: Fn(f64) -> f64 + Send + Sync,
    G: Fn(f64) -> f64 + Send + Sync,
{
    pub fn new(frequency_to_amplitude: F, amplitude_to_frequency: G) -> Self {
        Self {
            to_amplitude: frequency_to_amplitude,
            to_frequency: amplitude_to_frequency,
        }
    }
}

impl<F, G> CalibrationCurve for FnCalibration<F, G>
where
    F: Fn(f64) -> f64 + Send + Sync,
    G: Fn(f64) -> f64 + Send + Sync,
{
    fn frequency_to_amplitude(&self, frequency: f64) -> f64 {
        (self.to_amplitude)(frequency)
    }

    fn amplitude_to_frequency(&self, amplitude: f64) -> f64 {
        (self.to_frequency)(amplitude)
    }
}
