//! Seeded synthetic traces for demos and tests.
//!
//! The generators mirror the kind of data the calibration scripts produce:
//! exponential decays (T1-style) and noisy oscillations (Rabi/Ramsey-style).
//! Everything is deterministic given the seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ModelKind, Series};
use crate::error::{CalibError, Result};
use crate::models::predict;

/// `amplitude * sin(2π f x + phase) + offset + U[0, noise_span)`.
///
/// The noise is one-sided (non-zero mean), matching the packaged demo.
pub fn noisy_sine(
    amplitude: f64,
    frequency: f64,
    phase: f64,
    offset: f64,
    noise_span: f64,
    x: Vec<f64>,
    seed: u64,
) -> Result<Series> {
    if !(noise_span.is_finite() && noise_span >= 0.0) {
        return Err(CalibError::invalid(format!("noise span must be >= 0, got {noise_span}")));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let params = [amplitude, frequency, phase, offset];
    let y = x
        .iter()
        .map(|&xi| {
            let noise = if noise_span > 0.0 { rng.gen_range(0.0..noise_span) } else { 0.0 };
            predict(ModelKind::Sine, xi, &params) + noise
        })
        .collect();
    Series::new(x, y)
}

/// `amplitude * exp(rate * x)` with additive Gaussian noise of std `sigma`.
pub fn noisy_exponential(amplitude: f64, rate: f64, sigma: f64, x: Vec<f64>, seed: u64) -> Result<Series> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| CalibError::invalid(format!("Noise distribution error: {e}")))?;
    let params = [amplitude, rate];
    let y = x
        .iter()
        .map(|&xi| predict(ModelKind::Exponential, xi, &params) + normal.sample(&mut rng))
        .collect();
    Series::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linspace;

    #[test]
    fn same_seed_same_trace() {
        let a = noisy_sine(1.0, 1.0, 0.0, 0.0, 0.5, linspace(0.0, 1.0, 20), 3).unwrap();
        let b = noisy_sine(1.0, 1.0, 0.0, 0.0, 0.5, linspace(0.0, 1.0, 20), 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sine_noise_is_one_sided() {
        let x = linspace(0.0, 3.0, 50);
        let clean = noisy_sine(2.0, 0.7, 0.3, 1.0, 0.0, x.clone(), 1).unwrap();
        let noisy = noisy_sine(2.0, 0.7, 0.3, 1.0, 6.0, x, 1).unwrap();
        for (c, n) in clean.y().iter().zip(noisy.y()) {
            let d = n - c;
            assert!((0.0..6.0).contains(&d), "{d}");
        }
    }

    #[test]
    fn exponential_rejects_negative_sigma() {
        assert!(noisy_exponential(1.0, -1.0, -0.1, linspace(0.0, 1.0, 5), 0).is_err());
    }
}
