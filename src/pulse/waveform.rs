//! Queryable control waveform produced by the STA generator.

use crate::error::{CalibError, Result};
use crate::math::{Fill, Interp1d};
use crate::pulse::calibration::CalibrationCurve;

/// Amplitude returned for any time outside the waveform's support.
pub const FILL_VALUE: f64 = 0.0;

/// A generated pulse: the detuning profile `z(tau)` on the rescaled time axis
/// plus the calibration that turns it into control amplitudes.
///
/// The waveform borrows its calibration; it never owns or mutates it.
pub struct Waveform<'c> {
    profile: Interp1d,
    target_frequency: f64,
    start: f64,
    forward_end: f64,
    calibration: &'c dyn CalibrationCurve,
}

impl std::fmt::Debug for Waveform<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waveform")
            .field("samples", &self.profile.xs().len())
            .field("target_frequency", &self.target_frequency)
            .field("start", &self.start)
            .field("forward_end", &self.forward_end)
            .field("end", &self.end())
            .finish()
    }
}

impl<'c> Waveform<'c> {
    /// `tau` must be strictly increasing and as long as `z`. `forward_end` is
    /// the tau at which the forward ramp finishes (the last tau for a one-way
    /// pulse).
    pub(crate) fn new(
        tau: Vec<f64>,
        z: Vec<f64>,
        start: f64,
        forward_end: f64,
        target_frequency: f64,
        calibration: &'c dyn CalibrationCurve,
    ) -> Result<Self> {
        let profile = Interp1d::new(tau, z, Fill::Boundary)
            .ok_or_else(|| CalibError::domain("rescaled time axis is not strictly increasing"))?;
        Ok(Self {
            profile,
            target_frequency,
            start,
            forward_end,
            calibration,
        })
    }

    /// Control amplitude at time `t`. Defined for every real `t`; returns
    /// `FILL_VALUE` outside `(0, end)`.
    pub fn amplitude_at(&self, t: f64) -> f64 {
        if t > 0.0 && t < self.end() {
            self.calibration
                .frequency_to_amplitude(self.detuning_at(t) + self.target_frequency)
        } else {
            FILL_VALUE
        }
    }

    /// Interpolated `z` at `t`, holding the boundary value outside the samples.
    pub fn detuning_at(&self, t: f64) -> f64 {
        self.profile.eval(t)
    }

    pub fn sample(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.amplitude_at(t)).collect()
    }

    /// `(t, amplitude)` on a uniform grid from 0 to the end of the support.
    pub fn render(&self, dt: f64) -> Result<Vec<(f64, f64)>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CalibError::invalid(format!("render step must be > 0, got {dt}")));
        }
        let end = self.end();
        let steps = (end / dt).floor() as usize;
        Ok((0..=steps)
            .map(|i| {
                let t = i as f64 * dt;
                (t, self.amplitude_at(t))
            })
            .collect())
    }

    /// Interval outside of which `amplitude_at` returns the fill value.
    pub fn support(&self) -> (f64, f64) {
        (0.0, self.end())
    }

    /// Rescaled duration of the pulse, `max(tau) - t0`.
    pub fn support_len(&self) -> f64 {
        self.end() - self.start
    }

    pub fn end(&self) -> f64 {
        self.profile.domain().1
    }

    /// Tau at which the forward ramp reaches `theta_final`.
    pub fn forward_end(&self) -> f64 {
        self.forward_end
    }

    pub fn is_round_trip(&self) -> bool {
        self.forward_end < self.end()
    }

    pub fn tau(&self) -> &[f64] {
        self.profile.xs()
    }

    pub fn z(&self) -> &[f64] {
        self.profile.ys()
    }

    pub fn target_frequency(&self) -> f64 {
        self.target_frequency
    }

    pub fn calibration(&self) -> &'c dyn CalibrationCurve {
        self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::calibration::LinearCalibration;

    fn ramp(cal: &LinearCalibration) -> Waveform<'_> {
        Waveform::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3], 0.0, 3.0, 5.0, cal).unwrap()
    }

    #[test]
    fn amplitude_goes_through_calibration() {
        let cal = LinearCalibration::new(5.0, 1.0).unwrap();
        let w = ramp(&cal);
        assert!((w.amplitude_at(1.5) - 0.15).abs() < 1e-12);
        // Between 0 and the first sample the boundary z holds.
        assert!((w.amplitude_at(0.5) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn fill_value_outside_support() {
        let cal = LinearCalibration::new(5.0, 1.0).unwrap();
        let w = ramp(&cal);
        for t in [-1.0, 0.0, 3.0, 10.0, f64::NAN] {
            assert_eq!(w.amplitude_at(t), FILL_VALUE);
        }
        assert_eq!(w.support(), (0.0, 3.0));
        assert!(!w.is_round_trip());
    }

    #[test]
    fn render_covers_support() {
        let cal = LinearCalibration::new(5.0, 1.0).unwrap();
        let w = ramp(&cal);
        let pts = w.render(0.5).unwrap();
        assert_eq!(pts.len(), 7);
        assert_eq!(pts[0], (0.0, FILL_VALUE));
        assert_eq!(pts[6].0, 3.0);
        assert!(w.render(0.0).is_err());
    }

    #[test]
    fn rejects_unsorted_tau() {
        let cal = LinearCalibration::new(5.0, 1.0).unwrap();
        let err = Waveform::new(vec![2.0, 1.0], vec![0.0, 0.0], 0.0, 2.0, 5.0, &cal).unwrap_err();
        assert!(matches!(err, CalibError::Domain(_)));
    }
}
