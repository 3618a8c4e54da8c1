//! Model evaluation for the exponential / sinusoid / swap-spectrum families.
//!
//! The solver relies on two primitive operations:
//! - predict `y(x)` given a parameter vector (for residuals/plots)
//! - fill the Jacobian row `∂y/∂p` at a given `x` (for the linearized step)
//!
//! These are implemented here for each model kind.

use std::f64::consts::TAU;

use crate::domain::ModelKind;

/// Predict `y(x)` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.arity()`.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Exponential => {
            let (amp, rate) = (params[0], params[1]);
            amp * (rate * x).exp()
        }
        ModelKind::Sine => {
            let (amp, freq, phase, offset) = (params[0], params[1], params[2], params[3]);
            amp * (TAU * freq * x + phase).sin() + offset
        }
        ModelKind::SwapSpectrum => {
            let (slope, center, coupling) = (params[0], params[1], params[2]);
            let d = slope * (x - center);
            (d * d + 4.0 * coupling * coupling).sqrt()
        }
    }
}

/// Fill `out` with `∂y/∂p_j` at `x`.
///
/// # Panics
/// Panics if `out` or `params` is shorter than `model.arity()`.
pub fn fill_jacobian_row(model: ModelKind, x: f64, params: &[f64], out: &mut [f64]) {
    match model {
        ModelKind::Exponential => {
            let (amp, rate) = (params[0], params[1]);
            let e = (rate * x).exp();
            out[0] = e;
            out[1] = amp * x * e;
        }
        ModelKind::Sine => {
            let (amp, freq, phase) = (params[0], params[1], params[2]);
            let arg = TAU * freq * x + phase;
            let (s, c) = arg.sin_cos();
            out[0] = s;
            out[1] = amp * c * TAU * x;
            out[2] = amp * c;
            out[3] = 1.0;
        }
        ModelKind::SwapSpectrum => {
            let (slope, center, coupling) = (params[0], params[1], params[2]);
            let u = x - center;
            let f = ((slope * u).powi(2) + 4.0 * coupling * coupling).sqrt();
            if f == 0.0 {
                // The cone tip is not differentiable; a zero row keeps the
                // damped step well-defined.
                out[..3].fill(0.0);
                return;
            }
            out[0] = slope * u * u / f;
            out[1] = -slope * slope * u / f;
            out[2] = 4.0 * coupling / f;
        }
    }
}

/// Evaluate the model at every `x`.
pub fn predict_all(model: ModelKind, xs: &[f64], params: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| predict(model, x, params)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_row(model: ModelKind, x: f64, params: &[f64]) -> Vec<f64> {
        let h = 1e-6;
        (0..model.arity())
            .map(|j| {
                let mut hi = params.to_vec();
                let mut lo = params.to_vec();
                hi[j] += h;
                lo[j] -= h;
                (predict(model, x, &hi) - predict(model, x, &lo)) / (2.0 * h)
            })
            .collect()
    }

    #[test]
    fn analytic_jacobians_match_finite_differences() {
        let cases: [(ModelKind, &[f64]); 3] = [
            (ModelKind::Exponential, &[3.6, -0.65]),
            (ModelKind::Sine, &[1.5, 0.8, 0.4, 0.2]),
            (ModelKind::SwapSpectrum, &[2.0, 0.1, 0.03]),
        ];
        for (model, params) in cases {
            for &x in &[-1.3, 0.0, 0.7, 2.2] {
                let mut row = vec![0.0; model.arity()];
                fill_jacobian_row(model, x, params, &mut row);
                let num = numeric_row(model, x, params);
                for (a, b) in row.iter().zip(num.iter()) {
                    assert!((a - b).abs() < 1e-5 * (1.0 + b.abs()), "{model:?} x={x}: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn swap_spectrum_minimum_is_twice_coupling() {
        let y = predict(ModelKind::SwapSpectrum, 0.25, &[5.0, 0.25, 0.012]);
        assert!((y - 0.024).abs() < 1e-15);
    }
}
