//! Conditional phase accumulated by an STA ramp, and its inverse.
//!
//! For a ramp to `theta_final` over `T` with coupling `G` the accumulated
//! phase is `∫₀ᵀ 2πG·tan(θ(x)/2) dx`. The lookup tabulates that integral over a
//! grid of final angles and inverts it by linear interpolation, which is how a
//! target phase (typically π) is turned into a `theta_final`.

use std::f64::consts::{PI, TAU};

use rayon::prelude::*;
use tracing::debug;

use crate::error::{CalibError, Result};
use crate::math::{Fill, Interp1d, integrate, linspace};

const QUAD_TOLERANCE: f64 = 1e-10;

/// Number of angles in the default lookup grid.
pub const DEFAULT_GRID_POINTS: usize = 101;

/// Default angle grid, `π/8 ..= 0.99π`. The integrand diverges as the final
/// angle approaches π.
pub fn default_theta_grid() -> Vec<f64> {
    linspace(PI / 8.0, 0.99 * PI, DEFAULT_GRID_POINTS)
}

/// Phase accumulated by a one-way ramp ending at `theta_final`.
pub fn phase_accumulated(theta_final: f64, duration: f64, coupling: f64) -> Result<f64> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(CalibError::invalid(format!("duration must be > 0, got {duration}")));
    }
    if !(coupling.is_finite() && theta_final.is_finite()) {
        return Err(CalibError::invalid("coupling and final angle must be finite"));
    }
    let omega = TAU / duration;
    let theta = |x: f64| theta_final / duration * (x - (omega * x).sin() / omega);
    integrate(|x| TAU * coupling * (theta(x) / 2.0).tan(), 0.0, duration, QUAD_TOLERANCE).ok_or_else(
        || CalibError::domain(format!("phase integral does not converge for theta_final = {theta_final}")),
    )
}

/// Tabulated `phase -> theta_final` inverse for a fixed duration and coupling.
#[derive(Debug, Clone)]
pub struct PhaseLookup {
    duration: f64,
    coupling: f64,
    inverse: Interp1d,
}

impl PhaseLookup {
    /// Tabulate on the default angle grid.
    pub fn build(duration: f64, coupling: f64) -> Result<Self> {
        Self::with_grid(duration, coupling, &default_theta_grid())
    }

    /// Tabulate on a caller-supplied angle grid. The accumulated phase must be
    /// strictly monotonic over the grid.
    pub fn with_grid(duration: f64, coupling: f64, thetas: &[f64]) -> Result<Self> {
        if thetas.len() < 2 {
            return Err(CalibError::InsufficientData {
                required: 2,
                provided: thetas.len(),
            });
        }
        let phases: Vec<f64> = thetas
            .par_iter()
            .map(|&theta| phase_accumulated(theta, duration, coupling))
            .collect::<Result<_>>()?;

        let mut pairs: Vec<(f64, f64)> = phases.into_iter().zip(thetas.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let inverse = Interp1d::new(xs, ys, Fill::Value(f64::NAN))
            .ok_or_else(|| CalibError::domain("accumulated phase is not strictly monotonic over the angle grid"))?;

        let (lo, hi) = inverse.domain();
        debug!(duration, coupling, phase_min = lo, phase_max = hi, "phase lookup built");
        Ok(Self {
            duration,
            coupling,
            inverse,
        })
    }

    /// Final mixing angle whose ramp accumulates `phase`.
    pub fn target_mixing_angle(&self, phase: f64) -> Result<f64> {
        let (min, max) = self.range();
        if !(phase >= min && phase <= max) {
            return Err(CalibError::OutOfRange { value: phase, min, max });
        }
        Ok(self.inverse.eval(phase))
    }

    /// Tabulated phase range.
    pub fn range(&self) -> (f64, f64) {
        self.inverse.domain()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    /// `(phase, theta_final)` table, sorted by phase.
    pub fn table(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.inverse.xs().iter().copied().zip(self.inverse.ys().iter().copied())
    }
}
