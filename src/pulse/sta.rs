//! Shortcut-to-adiabaticity pulse shaping for the conditional-phase gate.
//!
//! The mixing angle follows a raised-cosine-smoothed ramp from `theta_initial`
//! to `theta_final`. The counter-diabatic field is folded back into a single z
//! control by a time reparameterization, giving samples `z(tau)` on a rescaled
//! (non-uniform) time axis.

use std::f64::consts::TAU;

use tracing::{debug, info};

use crate::domain::PulseSpec;
use crate::error::{CalibError, Result};
use crate::math::{Fill, Interp1d, cumsum, linspace};
use crate::pulse::calibration::CalibrationCurve;
use crate::pulse::waveform::Waveform;

/// Forward half of the pulse on the rescaled axis.
#[derive(Debug, Clone)]
struct Ramp {
    tau: Vec<f64>,
    z: Vec<f64>,
    /// Per-sample tau increments; reused (reversed) for the return trip.
    increments: Vec<f64>,
}

/// Mixing angle at `t0`, `atan(G / (detuning + nonlinearity))`, where the
/// detuning is the calibration's zero-amplitude frequency minus the target.
pub fn initial_mixing_angle(spec: &PulseSpec, calibration: &dyn CalibrationCurve) -> Result<f64> {
    let detuning = calibration.amplitude_to_frequency(0.0) - spec.target_frequency;
    let denominator = detuning + spec.nonlinearity;
    if !denominator.is_finite() || denominator == 0.0 {
        return Err(CalibError::domain(format!(
            "initial mixing angle undefined: detuning + nonlinearity = {denominator}"
        )));
    }
    Ok((spec.coupling / denominator).atan())
}

/// Generate the waveform described by `spec`.
///
/// The waveform borrows `calibration` for its amplitude queries.
pub fn generate<'c>(spec: &PulseSpec, calibration: &'c dyn CalibrationCurve) -> Result<Waveform<'c>> {
    validate(spec)?;
    let theta_initial = initial_mixing_angle(spec, calibration)?;
    let Ramp {
        mut tau,
        mut z,
        increments,
    } = forward_ramp(spec, theta_initial)?;
    let forward_end = tau[tau.len() - 1];

    if spec.return_trip {
        let back: Vec<f64> = increments.iter().rev().copied().collect();
        tau.extend(cumsum(&back).into_iter().map(|t| t + forward_end));
        let mirrored: Vec<f64> = z.iter().rev().copied().collect();
        z.extend(mirrored);
    }

    if let Some(i) = z
        .iter()
        .position(|&zi| !calibration.frequency_to_amplitude(zi + spec.target_frequency).is_finite())
    {
        return Err(CalibError::domain(format!(
            "calibration returned a non-finite amplitude at sample {i} (z = {})",
            z[i]
        )));
    }

    let waveform = Waveform::new(tau, z, spec.start, forward_end, spec.target_frequency, calibration)?;
    info!(
        theta_initial,
        theta_final = spec.theta_final,
        support_len = waveform.support_len(),
        return_trip = spec.return_trip,
        "pulse generated"
    );
    Ok(waveform)
}

/// Total time a sequence must reserve for a round-trip pulse:
/// `2 * (max forward tau - t0)`.
pub fn gate_length(spec: &PulseSpec, calibration: &dyn CalibrationCurve) -> Result<f64> {
    validate(spec)?;
    let theta_initial = initial_mixing_angle(spec, calibration)?;
    let ramp = forward_ramp(spec, theta_initial)?;
    Ok(2.0 * ramp.increments.iter().sum::<f64>())
}

fn validate(spec: &PulseSpec) -> Result<()> {
    if spec.samples < 2 {
        return Err(CalibError::invalid(format!(
            "pulse needs at least 2 samples, got {}",
            spec.samples
        )));
    }
    if !(spec.duration.is_finite() && spec.duration > 0.0) {
        return Err(CalibError::invalid(format!(
            "pulse duration must be > 0, got {}",
            spec.duration
        )));
    }
    if !(spec.coupling.is_finite() && spec.coupling > 0.0) {
        return Err(CalibError::invalid(format!(
            "coupling must be > 0, got {}",
            spec.coupling
        )));
    }
    if !(spec.start.is_finite() && spec.theta_final.is_finite()) {
        return Err(CalibError::invalid("pulse start and final angle must be finite"));
    }
    Ok(())
}

fn forward_ramp(spec: &PulseSpec, theta_initial: f64) -> Result<Ramp> {
    let n = spec.samples;
    let t = spec.duration;
    let g = spec.coupling;
    let t0 = spec.start;

    let lambda = (spec.theta_final - theta_initial) / t;
    let omega = TAU / t;
    let grid = linspace(t0, t0 + t, n);

    let theta: Vec<f64> = grid
        .iter()
        .map(|&tp| {
            let s = tp - t0;
            lambda * (s - (omega * s).sin() / omega) + theta_initial
        })
        .collect();
    let by: Vec<f64> = grid
        .iter()
        .map(|&tp| -(lambda / TAU) * (1.0 - (omega * (tp - t0)).cos()))
        .collect();
    let phi: Vec<f64> = by.iter().map(|&y| y.atan2(g)).collect();

    // Rate of the field angle in cycles per unit time, held at the left sample.
    let dt = grid[1] - grid[0];
    let dphi: Vec<f64> = phi.windows(2).map(|w| (w[1] - w[0]) / dt / TAU).collect();
    let dphi = Interp1d::new(grid[..n - 1].to_vec(), dphi, Fill::Value(0.0))
        .ok_or_else(|| CalibError::domain("pulse time grid is degenerate"))?;

    let magnitude: Vec<f64> = by.iter().map(|&y| y.hypot(g)).collect();
    let z: Vec<f64> = grid
        .iter()
        .zip(&theta)
        .zip(&magnitude)
        .map(|((&tp, &th), &m)| {
            let bz = g / th.tan() + dphi.eval(tp);
            g * bz / m
        })
        .collect();
    if let Some(i) = z.iter().position(|v| !v.is_finite()) {
        return Err(CalibError::domain(format!(
            "z is not finite at t = {} (theta = {})",
            grid[i], theta[i]
        )));
    }

    let increments: Vec<f64> = magnitude.iter().map(|&m| m / g * t / n as f64).collect();
    let tau: Vec<f64> = cumsum(&increments).into_iter().map(|v| v + t0).collect();
    if tau.iter().any(|v| !v.is_finite()) {
        return Err(CalibError::domain("rescaled time axis is not finite"));
    }
    debug!(samples = n, lambda, tau_end = tau[n - 1], "forward ramp");

    Ok(Ramp { tau, z, increments })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::pulse::calibration::LinearCalibration;
    use crate::pulse::waveform::FILL_VALUE;

    fn reference_spec() -> PulseSpec {
        PulseSpec {
            coupling: 0.01 * 2.0 * 2f64.sqrt(),
            theta_final: PI / 3.0,
            duration: 20.0,
            samples: 20001,
            target_frequency: 4.9,
            ..PulseSpec::default()
        }
    }

    fn calibration() -> LinearCalibration {
        LinearCalibration::new(5.0, -1.0).unwrap()
    }

    #[test]
    fn forward_support_is_stretched_but_shorter_than_round_trip() {
        let cal = calibration();
        let spec = reference_spec();
        let w = generate(&spec, &cal).unwrap();
        let len = w.support_len();
        assert!(len > spec.duration && len < 2.0 * spec.duration, "{len}");
        assert_eq!(w.tau().len(), spec.samples);
    }

    #[test]
    fn return_trip_doubles_support() {
        let cal = calibration();
        let one_way = generate(&reference_spec(), &cal).unwrap();
        let spec = PulseSpec {
            return_trip: true,
            ..reference_spec()
        };
        let round = generate(&spec, &cal).unwrap();
        assert_relative_eq!(round.support_len(), 2.0 * one_way.support_len(), max_relative = 1e-9);
        assert!(round.is_round_trip());
        assert_eq!(round.z().len(), 2 * spec.samples);
    }

    #[test]
    fn round_trip_is_continuous_at_turning_point() {
        let cal = calibration();
        let spec = PulseSpec {
            return_trip: true,
            ..reference_spec()
        };
        let w = generate(&spec, &cal).unwrap();
        let mid = w.forward_end();
        let before = w.amplitude_at(mid - 1e-9);
        let after = w.amplitude_at(mid + 1e-9);
        assert!((before - after).abs() < 1e-8, "{before} vs {after}");
        // Symmetric about the turning point.
        assert_relative_eq!(w.z()[0], w.z()[w.z().len() - 1]);
    }

    #[test]
    fn fill_value_outside_generated_support() {
        let cal = calibration();
        let w = generate(&reference_spec(), &cal).unwrap();
        let (lo, hi) = w.support();
        for t in [lo - 5.0, lo, hi, hi + 1.0, 1e9, -1e9] {
            assert_eq!(w.amplitude_at(t), FILL_VALUE);
        }
        assert!(w.amplitude_at(0.5 * hi) != FILL_VALUE);
    }

    #[test]
    fn generation_is_deterministic() {
        let cal = calibration();
        let a = generate(&reference_spec(), &cal).unwrap();
        let b = generate(&reference_spec(), &cal).unwrap();
        assert_eq!(a.tau(), b.tau());
        assert_eq!(a.z(), b.z());
        let probe = [0.1, 3.3, 10.0, 19.9];
        assert_eq!(a.sample(&probe), b.sample(&probe));
    }

    #[test]
    fn profile_starts_at_calibrated_detuning() {
        // At t0 By = 0, so z is G / tan(theta_initial) = detuning plus a tiny
        // finite-difference term.
        let cal = calibration();
        let w = generate(&reference_spec(), &cal).unwrap();
        assert_relative_eq!(w.z()[0], 0.1, max_relative = 1e-4);
    }

    #[test]
    fn zero_detuning_is_a_domain_error() {
        let cal = calibration();
        let spec = PulseSpec {
            target_frequency: 5.0,
            ..reference_spec()
        };
        assert!(matches!(generate(&spec, &cal), Err(CalibError::Domain(_))));
        assert!(matches!(gate_length(&spec, &cal), Err(CalibError::Domain(_))));
    }

    #[test]
    fn rejects_bad_parameters() {
        let cal = calibration();
        for spec in [
            PulseSpec { samples: 1, ..reference_spec() },
            PulseSpec { duration: 0.0, ..reference_spec() },
            PulseSpec { coupling: -0.1, ..reference_spec() },
        ] {
            assert!(matches!(generate(&spec, &cal), Err(CalibError::InvalidInput(_))));
        }
    }

    #[test]
    fn gate_length_is_twice_forward_support() {
        let cal = calibration();
        let spec = PulseSpec {
            start: 7.0,
            ..reference_spec()
        };
        let w = generate(&spec, &cal).unwrap();
        let len = gate_length(&spec, &cal).unwrap();
        assert_relative_eq!(len, 2.0 * w.support_len(), max_relative = 1e-9);
    }
}
