//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and pulse generation
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::f64::consts::PI;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CalibError, Result};

/// An ordered set of `(x, y)` samples with strictly monotonic `x`.
///
/// Construction validates the series once; afterwards it is immutable, so the
/// fitting code can rely on equal lengths, finite values and ordered `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Series {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(CalibError::invalid(format!(
                "x and y must have the same length (x={}, y={})",
                x.len(),
                y.len()
            )));
        }
        if let Some(i) = x.iter().chain(y.iter()).position(|v| !v.is_finite()) {
            return Err(CalibError::invalid(format!(
                "series contains a non-finite value (flat index {i})"
            )));
        }
        if x.len() >= 2 {
            let increasing = x[1] > x[0];
            let monotone = x.windows(2).all(|w| {
                if increasing {
                    w[1] > w[0]
                } else {
                    w[1] < w[0]
                }
            });
            if !monotone {
                return Err(CalibError::invalid("x must be strictly monotonic"));
            }
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Spacing of the first two samples (the sampling step for uniform data).
    pub fn step(&self) -> Option<f64> {
        (self.x.len() >= 2).then(|| self.x[1] - self.x[0])
    }

    /// `(min, max)` of the independent variable.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let first = *self.x.first()?;
        let last = *self.x.last()?;
        Some((first.min(last), first.max(last)))
    }
}

/// Model families supported by the fitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `amplitude * exp(rate * x)`
    #[value(name = "exp")]
    Exponential,
    /// `amplitude * sin(2π * frequency * x + phase) + offset`
    Sine,
    /// `sqrt((slope * (x - center))^2 + 4 * coupling^2)`, the swap frequency
    /// across an avoided crossing.
    #[value(name = "swap")]
    SwapSpectrum,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "exponential",
            ModelKind::Sine => "sinusoid",
            ModelKind::SwapSpectrum => "swap spectrum",
        }
    }

    /// Number of free parameters.
    pub fn arity(self) -> usize {
        match self {
            ModelKind::Exponential => 2,
            ModelKind::Sine => 4,
            ModelKind::SwapSpectrum => 3,
        }
    }

    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Exponential => &["amplitude", "rate"],
            ModelKind::Sine => &["amplitude", "frequency", "phase", "offset"],
            ModelKind::SwapSpectrum => &["slope", "center", "coupling"],
        }
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// Objective evaluations spent by the solver (accepted and rejected steps).
    pub iterations: usize,
    pub n: usize,
}

/// FFT magnitude spectrum of a detrended series.
///
/// Both axes are fft-shifted (negative frequencies first) so they plot as a
/// continuous curve. Frequencies are in inverse units of the series' `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    pub peak_frequency: f64,
}

/// Output of a single fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelKind,
    /// Always `model.arity()` long.
    pub params: Vec<f64>,
    pub initial_guess: Vec<f64>,
    /// Model evaluated at the input x-values.
    pub fitted: Vec<f64>,
    pub quality: FitQuality,
    /// Present when spectral analysis was requested for a sinusoid fit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum: Option<Spectrum>,
}

impl FitResult {
    /// Look up a parameter by name (`"rate"`, `"frequency"`, ...).
    pub fn param(&self, name: &str) -> Option<f64> {
        self.model
            .param_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.params.get(i).copied())
    }
}

/// A saved fit (JSON): the input series plus the fit output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub source: Option<String>,
    pub series: Series,
    pub result: FitResult,
}

/// Immutable configuration for one STA pulse.
///
/// Times are in the same unit throughout (ns in practice) and frequencies in
/// the inverse unit (GHz), so `coupling * duration` is dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSpec {
    /// Start of the ramp (`t0`).
    pub start: f64,
    /// Length of the forward ramp `T`; a round trip occupies roughly `2T`.
    pub duration: f64,
    /// Coupling strength `G` between the two levels being mixed.
    pub coupling: f64,
    /// Mixing angle reached at the end of the forward ramp.
    pub theta_final: f64,
    /// Operating frequency the z-control is referenced to.
    pub target_frequency: f64,
    /// Extra detuning term added to the calibration detuning when computing
    /// the initial mixing angle.
    pub nonlinearity: f64,
    /// Number of discretization points on the forward ramp (`N`).
    pub samples: usize,
    /// Whether the waveform ramps back down after reaching `theta_final`.
    pub return_trip: bool,
}

impl Default for PulseSpec {
    fn default() -> Self {
        Self {
            start: 0.0,
            duration: 20.0,
            coupling: 0.01 * 2.0 * 2f64.sqrt(),
            theta_final: PI / 3.0,
            target_frequency: 0.0,
            nonlinearity: 0.0,
            samples: 20001,
            return_trip: false,
        }
    }
}

/// Where the pulse command gets its calibration curve from.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationSource {
    Linear { zero_frequency: f64, slope: f64 },
    Table(PathBuf),
}

/// A fit run as understood by the pipeline (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub x_column: String,
    pub y_column: String,
    pub model: ModelKind,
    pub initial_guess: Option<Vec<f64>>,
    pub nfft_samples: usize,
    pub spectral_analysis: bool,
    /// How many of the largest residuals to list.
    pub top_n: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Fit JSON output.
    pub export: Option<PathBuf>,
    /// `x,y,fit,residual` CSV output.
    pub export_csv: Option<PathBuf>,
    pub svg: Option<PathBuf>,
}

/// A pulse generation run (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct PulseConfig {
    pub spec: PulseSpec,
    /// When set, `spec.theta_final` is replaced by the angle whose ramp
    /// accumulates this conditional phase.
    pub target_phase: Option<f64>,
    pub calibration: CalibrationSource,
    /// Sampling step for the exported/plotted waveform.
    pub dt: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export: Option<PathBuf>,
    pub svg: Option<PathBuf>,
}
