//! Parallel fitting of many independent datasets.
//!
//! A sweep typically produces one trace per setting (e.g. one Rabi oscillation
//! per drive amplitude). Each trace is fitted independently, so we fan out with
//! rayon and keep the results in input order.

use rayon::prelude::*;

use crate::domain::{FitResult, ModelKind, Series};
use crate::error::Result;
use crate::fit::fitter::{FitOptions, fit_model};

/// Fit every series with the same model. The output has one entry per input,
/// in input order; failures do not affect other entries.
pub fn fit_batch(
    series: &[Series],
    model: ModelKind,
    initial_guess: Option<&[f64]>,
    opts: &FitOptions,
) -> Vec<Result<FitResult>> {
    series
        .par_iter()
        .map(|s| fit_model(model, s, initial_guess, opts))
        .collect()
}

/// Peak FFT frequency of every series (e.g. swap frequency per detuning).
pub fn peak_frequencies(series: &[Series], nfft: usize) -> Vec<Result<f64>> {
    series
        .par_iter()
        .map(|s| crate::fit::guess::spectrum(s, nfft).map(|spec| spec.peak_frequency))
        .collect()
}
