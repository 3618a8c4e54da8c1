//! Top-level application orchestration.
//!
//! `src/main.rs` is tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the requested command
//! - prints reports/plots and writes optional exports

use std::f64::consts::PI;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, DemoArgs, FitArgs, PhaseArgs, PlotArgs, PulseArgs, ScheduleArgs};
use crate::domain::{CalibrationSource, FitConfig, ModelKind, PulseConfig, PulseSpec};
use crate::error::{CalibError, Result};
use crate::math::linspace;

pub mod pipeline;

/// Environment variable holding the log filter (`warn` when unset).
pub const LOG_ENV: &str = "CZCAL_LOG";

/// Rows of skipped CSV input to list before summarizing.
const MAX_ROW_ERRORS: usize = 10;

/// Entry point for the `czcal` binary.
pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Pulse(args) => handle_pulse(&args),
        Command::Phase(args) => handle_phase(&args),
        Command::Schedule(args) => handle_schedule(&args),
        Command::Plot(args) => handle_plot(&args),
        Command::Demo(args) => handle_demo(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so reports on stdout stay clean.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_fit(args: &FitArgs) -> Result<()> {
    let config = fit_config_from_args(args);
    let run = pipeline::run_fit(&config)?;

    let source = config.csv_path.display().to_string();
    println!(
        "{}",
        crate::report::format_fit_summary(&run.ingest.series, &run.result, Some(&source))
    );
    print!("{}", crate::report::format_row_errors(&run.ingest.row_errors, MAX_ROW_ERRORS));
    if !run.outliers.is_empty() {
        println!("{}", crate::report::format_residual_table(&run.outliers));
    }

    if config.plot {
        println!(
            "{}",
            crate::plot::render_fit_plot(&run.ingest.series, &run.result, config.plot_width, config.plot_height)
        );
        if let Some(spectrum) = &run.result.spectrum {
            println!(
                "{}",
                crate::plot::render_spectrum_plot(spectrum, config.plot_width, config.plot_height)
            );
        }
    }

    if let Some(path) = &config.export {
        crate::io::write_fit_json(path, &run.ingest.series, &run.result, Some(&config.csv_path))?;
        info!(path = %path.display(), "fit JSON written");
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_fit_csv(path, &run.ingest.series, &run.result)?;
        info!(path = %path.display(), "fit CSV written");
    }
    if let Some(path) = &config.svg {
        crate::plot::write_fit_svg(path, &run.ingest.series, &run.result, 800, 500)?;
        info!(path = %path.display(), "fit SVG written");
    }
    Ok(())
}

fn handle_pulse(args: &PulseArgs) -> Result<()> {
    let config = pulse_config_from_args(args)?;
    let calibration = pipeline::load_calibration(&config.calibration)?;
    let spec = pipeline::resolve_pulse_spec(&config)?;
    if let Some(phase) = config.target_phase {
        println!("Target phase {phase:.6} -> theta_final {:.6}", spec.theta_final);
    }

    let waveform = crate::pulse::generate(&spec, calibration.as_ref())?;
    let gate_length = crate::pulse::gate_length(&spec, calibration.as_ref())?;
    println!(
        "{}",
        crate::report::format_pulse_summary(&spec, &waveform, Some(gate_length))
    );

    if config.plot {
        println!(
            "{}",
            crate::plot::render_waveform_plot(&waveform, config.plot_width, config.plot_height)
        );
    }
    if let Some(path) = &config.export {
        let rows = crate::io::write_waveform_csv(path, &waveform, config.dt)?;
        info!(path = %path.display(), rows, "waveform CSV written");
    }
    if let Some(path) = &config.svg {
        crate::plot::write_waveform_svg(path, &waveform, config.dt, 800, 500)?;
        info!(path = %path.display(), "waveform SVG written");
    }
    Ok(())
}

fn handle_phase(args: &PhaseArgs) -> Result<()> {
    let lookup = crate::pulse::PhaseLookup::build(args.duration, args.coupling)?;
    let theta = lookup.target_mixing_angle(args.target_phase)?;
    print!("{}", crate::report::format_phase_result(&lookup, args.target_phase, theta));
    if args.table {
        println!("{:>12} {:>12}", "phase", "theta_final");
        for (phase, theta) in lookup.table() {
            println!("{phase:>12.6} {theta:>12.6}");
        }
    }
    Ok(())
}

fn handle_schedule(args: &ScheduleArgs) -> Result<()> {
    use crate::sequence::{QubitTiming, ScheduleBuilder, TwoQubitTiming, parse_layers};

    let layers = parse_layers(&args.gates)?;
    let two_qubit = TwoQubitTiming {
        cz_pulse: PulseSpec {
            duration: args.cz_duration,
            ..PulseSpec::default()
        },
        cz_buffer: args.cz_buffer,
        cz_phases: (args.phase0, args.phase1),
        ..TwoQubitTiming::default()
    };
    let mut builder = ScheduleBuilder::new(vec![QubitTiming::default(); 2], two_qubit);
    for layer in &layers {
        builder.apply_layer(layer)?;
    }
    let schedule = builder.finish();

    if args.json {
        let text = serde_json::to_string_pretty(&schedule)
            .map_err(|e| CalibError::io(format!("Failed to serialize schedule: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", crate::report::format_schedule(&schedule));
    }
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<()> {
    let saved = crate::io::read_fit_json(&args.fit)?;
    println!(
        "{}",
        crate::report::format_fit_summary(&saved.series, &saved.result, saved.source.as_deref())
    );
    println!(
        "{}",
        crate::plot::render_fit_plot(&saved.series, &saved.result, args.width, args.height)
    );
    if let Some(spectrum) = &saved.result.spectrum {
        println!("{}", crate::plot::render_spectrum_plot(spectrum, args.width, args.height));
    }
    if let Some(path) = &args.svg {
        crate::plot::write_fit_svg(path, &saved.series, &saved.result, 800, 500)?;
    }
    Ok(())
}

/// Fit a synthetic T1-style decay, a noisy oscillation and a small decay
/// sweep, as a smoke test of the whole fitting path.
fn handle_demo(args: &DemoArgs) -> Result<()> {
    use crate::data::{noisy_exponential, noisy_sine};
    use crate::fit::{FitOptions, fit_batch, fit_exponential, fit_sine};

    let opts = FitOptions {
        nfft_samples: args.nfft,
        spectral_analysis: true,
        ..FitOptions::default()
    };

    let decay = noisy_exponential(3.6, -0.65, 0.02, linspace(-5.0, 5.0, 100), args.seed)?;
    let fit = fit_exponential(&decay, None, &opts)?;
    print_demo_fit(&decay, &fit, args);

    let oscillation = noisy_sine(58.0, 1.0, 19.0, 20.0, 6.0, linspace(-5.0, 5.0, 100), args.seed)?;
    let fit = fit_sine(&oscillation, None, &opts)?;
    print_demo_fit(&oscillation, &fit, args);

    let rates = [-0.2, -0.4, -0.6, -0.8, -1.0];
    let sweep = rates
        .iter()
        .zip(args.seed..)
        .map(|(&rate, seed)| noisy_exponential(1.0, rate, 0.01, linspace(0.0, 8.0, 80), seed))
        .collect::<Result<Vec<_>>>()?;
    println!("{:>10} {:>12}", "true rate", "fitted rate");
    for (rate, result) in rates.iter().zip(fit_batch(&sweep, ModelKind::Exponential, None, &opts)) {
        match result {
            Ok(fit) => println!("{rate:>10.3} {:>12.5}", fit.params[1]),
            Err(e) => warn!(rate, "sweep fit failed: {e}"),
        }
    }
    Ok(())
}

fn print_demo_fit(series: &crate::domain::Series, fit: &crate::domain::FitResult, args: &DemoArgs) {
    println!("{}", crate::report::format_fit_summary(series, fit, Some("synthetic")));
    if args.plot.enabled() {
        println!(
            "{}",
            crate::plot::render_fit_plot(series, fit, args.plot.width, args.plot.height)
        );
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        csv_path: args.csv.clone(),
        x_column: args.x_col.clone(),
        y_column: args.y_col.clone(),
        model: args.model,
        initial_guess: args.guess.clone(),
        nfft_samples: args.nfft,
        spectral_analysis: args.spectrum,
        top_n: args.top,
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export: args.export.clone(),
        export_csv: args.export_csv.clone(),
        svg: args.svg.clone(),
    }
}

pub fn pulse_config_from_args(args: &PulseArgs) -> Result<PulseConfig> {
    let calibration = match (&args.cal_table, args.cal_f0, args.cal_slope) {
        (Some(path), _, _) => CalibrationSource::Table(path.clone()),
        (None, Some(zero_frequency), Some(slope)) => CalibrationSource::Linear { zero_frequency, slope },
        _ => {
            return Err(CalibError::invalid(
                "a calibration is required: --cal-f0 and --cal-slope, or --cal-table",
            ));
        }
    };
    if let Some(phase) = args.target_phase {
        if !(phase > 0.0 && phase.is_finite()) {
            return Err(CalibError::invalid(format!("target phase must be > 0, got {phase}")));
        }
        if phase > 2.0 * PI {
            warn!(phase, "target phase above 2π; the lookup will most likely reject it");
        }
    }
    Ok(PulseConfig {
        spec: PulseSpec {
            start: args.start,
            duration: args.duration,
            coupling: args.coupling,
            theta_final: args.theta_final,
            target_frequency: args.target_frequency,
            nonlinearity: args.nonlinearity,
            samples: args.samples,
            return_trip: args.return_trip,
        },
        target_phase: args.target_phase,
        calibration,
        dt: args.dt,
        plot: args.plot.enabled(),
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export: args.export.clone(),
        svg: args.svg.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn pulse_args(extra: &[&str]) -> PulseArgs {
        let mut argv = vec!["czcal", "pulse", "--target-frequency", "4.9"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Pulse(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn pulse_config_requires_calibration() {
        let err = pulse_config_from_args(&pulse_args(&[])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn pulse_config_linear_calibration() {
        let config = pulse_config_from_args(&pulse_args(&["--cal-f0", "5.0", "--cal-slope", "-1", "--return-trip"]))
            .unwrap();
        assert_eq!(
            config.calibration,
            CalibrationSource::Linear {
                zero_frequency: 5.0,
                slope: -1.0
            }
        );
        assert!(config.spec.return_trip);
        assert_eq!(config.spec.samples, 20001);
    }

    #[test]
    fn fit_config_carries_flags() {
        let cli = Cli::parse_from(["czcal", "fit", "sine", "--csv", "rabi.csv", "--spectrum", "--nfft", "4096"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args);
        assert_eq!(config.model, ModelKind::Sine);
        assert!(config.spectral_analysis);
        assert_eq!(config.nfft_samples, 4096);
        assert!(config.plot);
    }
}
