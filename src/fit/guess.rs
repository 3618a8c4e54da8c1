//! Automatic initial-parameter estimates for the sinusoid model.
//!
//! The estimates are deliberately simple and deterministic:
//!
//! - amplitude / offset from order statistics (mean of the top and bottom
//!   `floor(n/50)+1` samples, so a single outlier cannot dominate)
//! - frequency from the peak of a zero-padded FFT of the detrended data
//! - phase from a coarse heuristic that averages the data near integer `x`
//!
//! The phase heuristic only makes sense when the data's period is close to one
//! unit of `x`. It is kept as a ballpark starting point; the least-squares
//! step does the real work.

use tracing::debug;

use crate::domain::{Series, Spectrum};
use crate::error::{CalibError, Result};
use crate::math::{Fill, Interp1d, argmax, arange, fft_magnitude, fftfreq, fftshift, fit_line};

/// Default zero-padded FFT length.
pub const DEFAULT_NFFT: usize = 10_000;

/// Relative tolerance for "x is close to an integer" in the phase heuristic.
const PHASE_WINDOW: f64 = 0.001;

/// Resampling step for the phase heuristic, relative to the data step.
const PHASE_RESAMPLE: f64 = 0.001;

/// Individual sinusoid estimates, in `[amplitude, frequency, phase, offset]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineGuess {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
    pub offset: f64,
}

impl SineGuess {
    pub fn to_params(self) -> Vec<f64> {
        vec![self.amplitude, self.frequency, self.phase, self.offset]
    }
}

/// Estimate all four sinusoid parameters from the data.
pub fn sine_initial_guess(series: &Series, nfft: usize) -> Result<SineGuess> {
    if series.len() < 2 {
        return Err(CalibError::InsufficientData {
            required: 2,
            provided: series.len(),
        });
    }
    let (amplitude, offset) = extremes_amplitude_offset(series.y());
    let frequency = spectrum(series, nfft)?.peak_frequency;
    let phase = phase_heuristic(series);

    let guess = SineGuess {
        amplitude,
        frequency,
        phase,
        offset,
    };
    debug!(?guess, nfft, "sinusoid initial guess");
    Ok(guess)
}

/// Half the gap (amplitude) and midpoint (offset) of the extreme buckets.
pub fn extremes_amplitude_offset(y: &[f64]) -> (f64, f64) {
    if y.is_empty() {
        return (0.0, 0.0);
    }
    let mut sorted = y.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let k = (sorted.len() / 50 + 1).min(sorted.len());
    let low = mean(&sorted[..k]);
    let high = mean(&sorted[sorted.len() - k..]);
    ((high - low) / 2.0, (high + low) / 2.0)
}

/// FFT magnitude spectrum of the linearly detrended series.
///
/// The sample spacing is taken from the first two samples, so the result is
/// only meaningful for uniformly sampled data.
pub fn spectrum(series: &Series, nfft: usize) -> Result<Spectrum> {
    if nfft < 2 {
        return Err(CalibError::invalid(format!("nfft must be >= 2, got {nfft}")));
    }
    let step = series.step().ok_or(CalibError::InsufficientData {
        required: 2,
        provided: series.len(),
    })?;
    let (intercept, slope) = fit_line(series.x(), series.y())
        .ok_or_else(|| CalibError::domain("could not detrend series (degenerate x)"))?;
    let detrended: Vec<f64> = series
        .x()
        .iter()
        .zip(series.y())
        .map(|(&x, &y)| y - (intercept + slope * x))
        .collect();

    let magnitudes = fft_magnitude(&detrended, nfft);
    let frequencies = fftfreq(nfft, step);
    let peak = argmax(&magnitudes).ok_or_else(|| CalibError::domain("empty spectrum"))?;
    let peak_frequency = frequencies[peak].abs();

    Ok(Spectrum {
        frequencies: fftshift(&frequencies),
        magnitudes: fftshift(&magnitudes),
        peak_frequency,
    })
}

/// Frequency bin width for a spectrum of `series` with `nfft` points.
pub fn bin_width(series: &Series, nfft: usize) -> Option<f64> {
    series.step().map(|d| 1.0 / (nfft as f64 * d.abs()))
}

/// Average of the (resampled) data whose `x` lies within a relative window of
/// a non-zero integer. Returns 0 when no resampled point qualifies.
fn phase_heuristic(series: &Series) -> f64 {
    let Some(step) = series.step() else {
        return 0.0;
    };
    let Some((x_min, x_max)) = series.x_range() else {
        return 0.0;
    };

    // Interp1d wants an increasing grid.
    let (xs, ys) = if step > 0.0 {
        (series.x().to_vec(), series.y().to_vec())
    } else {
        (
            series.x().iter().rev().copied().collect(),
            series.y().iter().rev().copied().collect(),
        )
    };
    let Some(interp) = Interp1d::new(xs, ys, Fill::Boundary) else {
        return 0.0;
    };

    let mut sum = 0.0;
    let mut count = 0usize;
    for x in arange(x_min, x_max, PHASE_RESAMPLE * step.abs()) {
        let k = x.round();
        if k == 0.0 {
            continue;
        }
        if (x / k - 1.0).abs() < PHASE_WINDOW {
            sum += interp.eval(x);
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
