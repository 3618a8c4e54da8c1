//! Command-line parsing for `czcal`.
//!
//! Argument parsing and command dispatch stay separate from the numerical
//! code; `app` turns these structs into `FitConfig` / `PulseConfig`.

use std::f64::consts::PI;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;
use crate::fit::DEFAULT_NFFT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "czcal",
    version,
    about = "Curve fitting and STA pulse shaping for qubit calibration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model to two columns of a CSV file.
    Fit(FitArgs),
    /// Generate an STA conditional-phase pulse.
    Pulse(PulseArgs),
    /// Find the final mixing angle that accumulates a given conditional phase.
    Phase(PhaseArgs),
    /// Lay out a two-qubit gate sequence in time.
    Schedule(ScheduleArgs),
    /// Plot a previously saved fit JSON.
    Plot(PlotArgs),
    /// Fit synthetic decay and oscillation traces.
    Demo(DemoArgs),
}

/// Terminal plot options shared by several commands.
#[derive(Debug, Args, Clone)]
pub struct PlotOptions {
    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

impl PlotOptions {
    pub fn enabled(&self) -> bool {
        self.plot && !self.no_plot
    }
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Model to fit.
    #[arg(value_enum)]
    pub model: ModelKind,

    /// Input CSV with a header row.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Column holding the independent variable.
    #[arg(long = "x-col", default_value = "x")]
    pub x_col: String,

    /// Column holding the measured values.
    #[arg(long = "y-col", default_value = "y")]
    pub y_col: String,

    /// Initial guess, comma separated in parameter order.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub guess: Option<Vec<f64>>,

    /// FFT length for the sinusoid frequency estimate.
    #[arg(long, default_value_t = DEFAULT_NFFT)]
    pub nfft: usize,

    /// Print (and plot) the FFT spectrum of a sinusoid fit.
    #[arg(long)]
    pub spectrum: bool,

    /// List this many of the largest residuals.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Save the fit (series + parameters) as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Save `x,y,fit,residual` rows as CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Save the plot as SVG.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PulseArgs {
    /// Ramp start time t0.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub start: f64,

    /// Forward ramp length T.
    #[arg(long, default_value_t = 20.0)]
    pub duration: f64,

    /// Coupling strength G.
    #[arg(long, default_value_t = 0.01 * 2.0 * std::f64::consts::SQRT_2)]
    pub coupling: f64,

    /// Final mixing angle (rad). Ignored when --target-phase is given.
    #[arg(long = "theta-final", default_value_t = PI / 3.0)]
    pub theta_final: f64,

    /// Choose the final angle that accumulates this conditional phase (rad).
    #[arg(long = "target-phase")]
    pub target_phase: Option<f64>,

    /// Operating frequency the z control is referenced to.
    #[arg(long = "target-frequency", allow_hyphen_values = true)]
    pub target_frequency: f64,

    /// Extra detuning added when computing the initial mixing angle.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub nonlinearity: f64,

    /// Discretization points on the forward ramp.
    #[arg(long, default_value_t = 20001)]
    pub samples: usize,

    /// Ramp back down after reaching the final angle.
    #[arg(long = "return-trip")]
    pub return_trip: bool,

    /// Linear calibration: frequency at zero amplitude.
    #[arg(long = "cal-f0", requires = "cal_slope", allow_hyphen_values = true)]
    pub cal_f0: Option<f64>,

    /// Linear calibration: frequency change per unit amplitude.
    #[arg(long = "cal-slope", requires = "cal_f0", allow_hyphen_values = true)]
    pub cal_slope: Option<f64>,

    /// Tabulated calibration CSV with `amplitude,frequency` columns.
    #[arg(long = "cal-table", value_name = "CSV", conflicts_with_all = ["cal_f0", "cal_slope"])]
    pub cal_table: Option<PathBuf>,

    /// Sampling step for export and plots.
    #[arg(long, default_value_t = 0.1)]
    pub dt: f64,

    #[command(flatten)]
    pub plot: PlotOptions,

    /// Save `t,amplitude,z` rows as CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Save the waveform plot as SVG.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PhaseArgs {
    /// Forward ramp length T.
    #[arg(long, default_value_t = 20.0)]
    pub duration: f64,

    /// Coupling strength G.
    #[arg(long, default_value_t = 0.02 * std::f64::consts::SQRT_2)]
    pub coupling: f64,

    /// Conditional phase to reach (rad).
    #[arg(long = "target-phase", default_value_t = PI)]
    pub target_phase: f64,

    /// Also print the tabulated phase/angle pairs.
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ScheduleArgs {
    /// Layers separated by `;`, per-qubit gates by `,` (e.g. "X/2,I; CZ; -Y,IW").
    pub gates: String,

    /// CZ ramp length T (the pulse occupies about 2T).
    #[arg(long = "cz-duration", default_value_t = 20.0)]
    pub cz_duration: f64,

    /// Buffer on each side of the CZ pulse.
    #[arg(long = "cz-buffer", default_value_t = 8.0)]
    pub cz_buffer: f64,

    /// Phase correction applied to the control qubit after a CZ.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub phase0: f64,

    /// Phase correction applied to the target qubit after a CZ.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub phase1: f64,

    /// Print the schedule as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Options for plotting a saved fit.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Fit JSON produced by `czcal fit --export`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Save the plot as SVG as well.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Seed for the synthetic noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// FFT length for the sinusoid frequency estimate.
    #[arg(long, default_value_t = DEFAULT_NFFT)]
    pub nfft: usize,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_negative_guess() {
        let cli = Cli::parse_from(["czcal", "fit", "exp", "--csv", "t1.csv", "--guess", "2,-0.5", "--no-plot"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.model, ModelKind::Exponential);
        assert_eq!(args.guess, Some(vec![2.0, -0.5]));
        assert!(!args.plot.enabled());
    }

    #[test]
    fn pulse_calibration_sources_conflict() {
        let res = Cli::try_parse_from([
            "czcal",
            "pulse",
            "--target-frequency",
            "4.9",
            "--cal-f0",
            "5.0",
            "--cal-slope",
            "-1",
            "--cal-table",
            "cal.csv",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn schedule_takes_positional_gates() {
        let cli = Cli::parse_from(["czcal", "schedule", "X,I; CZ"]);
        let Command::Schedule(args) = cli.command else {
            panic!("expected schedule");
        };
        assert_eq!(args.gates, "X,I; CZ");
        assert_eq!(args.cz_duration, 20.0);
    }
}
