//! Public fitting routines.
//!
//! Given:
//! - a validated `Series`
//! - a model kind
//! - an optional initial guess
//!
//! we (optionally) estimate a starting point, run Levenberg–Marquardt and
//! package the result with the fitted curve and quality diagnostics.

use tracing::info;

use crate::domain::{FitQuality, FitResult, ModelKind, Series};
use crate::error::{CalibError, Result};
use crate::fit::guess::{DEFAULT_NFFT, sine_initial_guess, spectrum};
use crate::fit::lm::{LmOptions, levenberg_marquardt};
use crate::models::predict_all;

/// Starting point used by `fit_exponential` when no guess is given.
pub const DEFAULT_EXPONENTIAL_GUESS: [f64; 2] = [1.0, 1.0];

/// Options shared by all fit routines.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub lm: LmOptions,
    /// Zero-padded FFT length for the sinusoid frequency estimate.
    pub nfft_samples: usize,
    /// Attach the FFT spectrum to sinusoid fits.
    pub spectral_analysis: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            lm: LmOptions::default(),
            nfft_samples: DEFAULT_NFFT,
            spectral_analysis: false,
        }
    }
}

/// Fit `amplitude * exp(rate * x)`. Defaults to the guess `[1, 1]`.
pub fn fit_exponential(series: &Series, initial_guess: Option<&[f64]>, opts: &FitOptions) -> Result<FitResult> {
    let guess = initial_guess.unwrap_or(&DEFAULT_EXPONENTIAL_GUESS).to_vec();
    run(ModelKind::Exponential, series, guess, opts)
}

/// Fit `amplitude * sin(2π * frequency * x + phase) + offset`.
///
/// Without an initial guess, all four parameters are estimated from the data
/// (see `crate::fit::guess`).
pub fn fit_sine(series: &Series, initial_guess: Option<&[f64]>, opts: &FitOptions) -> Result<FitResult> {
    check_size(ModelKind::Sine, series)?;
    let guess = match initial_guess {
        Some(g) => g.to_vec(),
        None => sine_initial_guess(series, opts.nfft_samples)?.to_params(),
    };
    let mut result = run(ModelKind::Sine, series, guess, opts)?;
    if opts.spectral_analysis {
        result.spectrum = Some(spectrum(series, opts.nfft_samples)?);
    }
    Ok(result)
}

/// Fit the avoided-crossing swap frequency `sqrt((slope * (x - center))^2 + 4 * coupling^2)`.
///
/// Without an initial guess, the center is placed at the minimum of the data,
/// the coupling at half that minimum and the slope from the steeper flank.
pub fn fit_swap_spectrum(series: &Series, initial_guess: Option<&[f64]>, opts: &FitOptions) -> Result<FitResult> {
    check_size(ModelKind::SwapSpectrum, series)?;
    let guess = match initial_guess {
        Some(g) => g.to_vec(),
        None => swap_initial_guess(series),
    };
    run(ModelKind::SwapSpectrum, series, guess, opts)
}

/// Dispatch on the model kind.
pub fn fit_model(
    model: ModelKind,
    series: &Series,
    initial_guess: Option<&[f64]>,
    opts: &FitOptions,
) -> Result<FitResult> {
    match model {
        ModelKind::Exponential => fit_exponential(series, initial_guess, opts),
        ModelKind::Sine => fit_sine(series, initial_guess, opts),
        ModelKind::SwapSpectrum => fit_swap_spectrum(series, initial_guess, opts),
    }
}

fn run(model: ModelKind, series: &Series, guess: Vec<f64>, opts: &FitOptions) -> Result<FitResult> {
    check_size(model, series)?;
    if guess.len() != model.arity() {
        return Err(CalibError::invalid(format!(
            "initial guess for the {} model needs {} values, got {}",
            model.display_name(),
            model.arity(),
            guess.len()
        )));
    }
    if guess.iter().any(|v| !v.is_finite()) {
        return Err(CalibError::invalid(format!("initial guess {guess:?} is not finite")));
    }

    let report = levenberg_marquardt(model, series.x(), series.y(), &guess, &opts.lm)?;
    let n = series.len();
    let fitted = predict_all(model, series.x(), &report.params);

    info!(
        model = model.display_name(),
        n,
        evaluations = report.evaluations,
        sse = report.cost,
        params = ?report.params,
        "fit complete"
    );

    Ok(FitResult {
        model,
        params: report.params,
        initial_guess: guess,
        fitted,
        quality: FitQuality {
            sse: report.cost,
            rmse: (report.cost / n as f64).sqrt(),
            iterations: report.evaluations,
            n,
        },
        spectrum: None,
    })
}

fn check_size(model: ModelKind, series: &Series) -> Result<()> {
    if series.len() < model.arity() {
        return Err(CalibError::InsufficientData {
            required: model.arity(),
            provided: series.len(),
        });
    }
    Ok(())
}

fn swap_initial_guess(series: &Series) -> Vec<f64> {
    let x = series.x();
    let y = series.y();
    let i_min = y
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let center = x[i_min];
    let floor = y[i_min].abs();
    let coupling = (floor / 2.0).max(f64::EPSILON);

    let slope = [0, x.len() - 1]
        .iter()
        .filter(|&&i| x[i] != center)
        .map(|&i| {
            let rise = (y[i] * y[i] - floor * floor).max(0.0).sqrt();
            rise / (x[i] - center).abs()
        })
        .fold(0.0_f64, f64::max);

    vec![if slope > 0.0 { slope } else { 1.0 }, center, coupling]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linspace;
    use crate::models::predict;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn series_for(model: ModelKind, params: &[f64], x: Vec<f64>) -> Series {
        let y = predict_all(model, &x, params);
        Series::new(x, y).unwrap()
    }

    #[test]
    fn exponential_recovers_decay_parameters() {
        let series = series_for(ModelKind::Exponential, &[3.6, -0.65], linspace(-5.0, 5.0, 100));
        let fit = fit_exponential(&series, None, &FitOptions::default()).unwrap();
        assert_eq!(fit.params.len(), 2);
        assert_eq!(fit.initial_guess, vec![1.0, 1.0]);
        assert_abs_diff_eq!(fit.param("amplitude").unwrap(), 3.6, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.param("rate").unwrap(), -0.65, epsilon = 1e-6);
        assert_eq!(fit.fitted.len(), 100);
    }

    #[test]
    fn exponential_recovers_regardless_of_guess_signs() {
        let series = series_for(ModelKind::Exponential, &[3.6, -0.65], linspace(-5.0, 5.0, 100));
        for guess in [[-1.0, -0.1], [5.0, 2.0], [1.0, 3.0], [-1.0, 1.0], [0.1, -3.0]] {
            let fit = fit_exponential(&series, Some(&guess), &FitOptions::default()).unwrap();
            assert_abs_diff_eq!(fit.params[0], 3.6, epsilon = 1e-6);
            assert_abs_diff_eq!(fit.params[1], -0.65, epsilon = 1e-6);
        }
    }

    #[test]
    fn far_guesses_never_return_a_poor_fit() {
        let series = series_for(ModelKind::Exponential, &[3.6, -0.65], linspace(-5.0, 5.0, 100));
        let tight = FitOptions {
            lm: LmOptions {
                max_evaluations: Some(40),
                ..LmOptions::default()
            },
            ..FitOptions::default()
        };
        for opts in [FitOptions::default(), tight] {
            for guess in [[5.0, 2.0], [1.0, 3.0], [1.0, -5.0], [100.0, 5.0], [-5.0, -2.0]] {
                match fit_exponential(&series, Some(&guess), &opts) {
                    Ok(fit) => assert!(fit.quality.sse < 1e-12, "{guess:?} -> {:?}", fit.params),
                    Err(err) => assert!(matches!(err, CalibError::Convergence { .. }), "{guess:?} -> {err:?}"),
                }
            }
        }
    }

    #[test]
    fn sine_auto_guess_recovers_all_parameters() {
        let truth = [1.5, 0.8, 0.4, 0.2];
        let series = series_for(ModelKind::Sine, &truth, linspace(0.0, 20.0, 801));
        let opts = FitOptions {
            spectral_analysis: true,
            ..FitOptions::default()
        };
        let fit = fit_sine(&series, None, &opts).unwrap();
        assert_eq!(fit.params.len(), 4);
        assert_abs_diff_eq!(fit.params[0], truth[0], epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[1], truth[1], epsilon = 1e-6);
        // Phase is only defined modulo 2π.
        let dphi = (fit.params[2] - truth[2]).rem_euclid(2.0 * PI);
        assert!(dphi < 1e-6 || 2.0 * PI - dphi < 1e-6, "phase {}", fit.params[2]);
        assert_abs_diff_eq!(fit.params[3], truth[3], epsilon = 1e-6);

        let spectrum = fit.spectrum.expect("spectral analysis requested");
        assert!((spectrum.peak_frequency - 0.8).abs() < 0.01);
    }

    #[test]
    fn fits_packaged_noisy_sine_trace() {
        // 58 sin(2π x + 19) + 20 + U[0, 6), the packaged demo trace.
        let series = crate::data::noisy_sine(58.0, 1.0, 19.0, 20.0, 6.0, linspace(-5.0, 5.0, 100), 7).unwrap();
        let fit = fit_sine(&series, None, &FitOptions::default()).unwrap();
        assert!((fit.params[0].abs() - 58.0).abs() < 2.0, "{:?}", fit.params);
        assert!((fit.params[1].abs() - 1.0).abs() < 0.01, "{:?}", fit.params);
        assert!((fit.params[3] - 23.0).abs() < 1.5, "{:?}", fit.params);
    }

    #[test]
    fn explicit_sine_guess_is_used_verbatim() {
        let truth = [2.0, 0.5, 1.0, -1.0];
        let series = series_for(ModelKind::Sine, &truth, linspace(0.0, 8.0, 200));
        let guess = [1.8, 0.48, 0.9, -0.8];
        let fit = fit_sine(&series, Some(&guess), &FitOptions::default()).unwrap();
        assert_eq!(fit.initial_guess, guess.to_vec());
        assert!(fit.spectrum.is_none());
        for (a, b) in fit.params.iter().zip(truth.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        let series = Series::new(vec![0.0, 1.0, 2.0], vec![1.0, 0.0, -1.0]).unwrap();
        let err = fit_sine(&series, None, &FitOptions::default()).unwrap_err();
        assert_eq!(err, CalibError::InsufficientData { required: 4, provided: 3 });

        let one = Series::new(vec![0.0], vec![1.0]).unwrap();
        let err = fit_exponential(&one, None, &FitOptions::default()).unwrap_err();
        assert!(matches!(err, CalibError::InsufficientData { required: 2, provided: 1 }));
    }

    #[test]
    fn wrong_guess_arity_is_rejected() {
        let series = series_for(ModelKind::Exponential, &[1.0, 0.1], linspace(0.0, 1.0, 10));
        let err = fit_exponential(&series, Some(&[1.0, 2.0, 3.0]), &FitOptions::default()).unwrap_err();
        assert!(matches!(err, CalibError::InvalidInput(_)));
    }

    #[test]
    fn swap_spectrum_recovers_coupling() {
        let truth = [3.0, 0.02, 0.015];
        let series = series_for(ModelKind::SwapSpectrum, &truth, linspace(-0.1, 0.1, 81));
        let fit = fit_swap_spectrum(&series, None, &FitOptions::default()).unwrap();
        assert_abs_diff_eq!(fit.params[0].abs(), truth[0], epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[1], truth[1], epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[2].abs(), truth[2], epsilon = 1e-6);
        assert_abs_diff_eq!(predict(ModelKind::SwapSpectrum, truth[1], &fit.params), 0.03, epsilon = 1e-6);
    }

    #[test]
    fn fit_model_dispatches() {
        let series = series_for(ModelKind::Exponential, &[2.0, -0.3], linspace(0.0, 4.0, 30));
        let fit = fit_model(ModelKind::Exponential, &series, None, &FitOptions::default()).unwrap();
        assert_eq!(fit.model, ModelKind::Exponential);
        assert!(fit.quality.rmse < 1e-8);
    }
}
