//! Reporting utilities: residuals, outliers, and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{FitResult, Series};
use crate::error::{CalibError, Result};

/// One measured sample against the fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    pub index: usize,
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Pair every sample with its fitted value.
pub fn compute_residuals(series: &Series, fit: &FitResult) -> Result<Vec<Residual>> {
    if fit.fitted.len() != series.len() {
        return Err(CalibError::invalid(format!(
            "fit has {} fitted values for {} samples",
            fit.fitted.len(),
            series.len()
        )));
    }
    Ok(series
        .x()
        .iter()
        .zip(series.y())
        .zip(&fit.fitted)
        .enumerate()
        .map(|(index, ((&x, &y_obs), &y_fit))| Residual {
            index,
            x,
            y_obs,
            y_fit,
            residual: y_obs - y_fit,
        })
        .collect())
}

/// The `top_n` samples furthest from the fit, largest first.
pub fn largest_residuals(residuals: &[Residual], top_n: usize) -> Vec<Residual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual.abs().total_cmp(&a.residual.abs()));
    sorted.truncate(top_n);
    sorted
}
