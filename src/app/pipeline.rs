//! Shared run logic behind the `fit` and `pulse` commands.
//!
//! Keeping the workflow here (ingest -> fit -> residuals, or calibration ->
//! angle lookup -> pulse) lets the command handlers focus on presentation.

use crate::domain::{CalibrationSource, FitConfig, FitResult, PulseConfig, PulseSpec};
use crate::error::Result;
use crate::fit::{FitOptions, fit_model};
use crate::io::ingest::{IngestedSeries, load_calibration_table, load_series};
use crate::pulse::{CalibrationCurve, LinearCalibration, PhaseLookup};
use crate::report::{Residual, compute_residuals, largest_residuals};

/// All computed outputs of a single `czcal fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub ingest: IngestedSeries,
    pub result: FitResult,
    pub residuals: Vec<Residual>,
    pub outliers: Vec<Residual>,
}

/// Load the CSV and fit the configured model.
pub fn run_fit(config: &FitConfig) -> Result<FitRun> {
    let ingest = load_series(&config.csv_path, &config.x_column, &config.y_column)?;
    let opts = FitOptions {
        nfft_samples: config.nfft_samples,
        spectral_analysis: config.spectral_analysis,
        ..FitOptions::default()
    };
    let result = fit_model(config.model, &ingest.series, config.initial_guess.as_deref(), &opts)?;
    let residuals = compute_residuals(&ingest.series, &result)?;
    let outliers = largest_residuals(&residuals, config.top_n);
    Ok(FitRun {
        ingest,
        result,
        residuals,
        outliers,
    })
}

/// Build the calibration curve a pulse run refers to.
pub fn load_calibration(source: &CalibrationSource) -> Result<Box<dyn CalibrationCurve>> {
    Ok(match source {
        CalibrationSource::Linear { zero_frequency, slope } => {
            Box::new(LinearCalibration::new(*zero_frequency, *slope)?)
        }
        CalibrationSource::Table(path) => Box::new(load_calibration_table(path)?),
    })
}

/// Final pulse spec, with `theta_final` resolved from a target phase if one
/// was requested.
pub fn resolve_pulse_spec(config: &PulseConfig) -> Result<PulseSpec> {
    let Some(phase) = config.target_phase else {
        return Ok(config.spec);
    };
    let lookup = PhaseLookup::build(config.spec.duration, config.spec.coupling)?;
    Ok(PulseSpec {
        theta_final: lookup.target_mixing_angle(phase)?,
        ..config.spec
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::error::CalibError;

    fn pulse_config(target_phase: Option<f64>) -> PulseConfig {
        PulseConfig {
            spec: PulseSpec {
                target_frequency: 4.9,
                ..PulseSpec::default()
            },
            target_phase,
            calibration: CalibrationSource::Linear {
                zero_frequency: 5.0,
                slope: -1.0,
            },
            dt: 0.1,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export: None,
            svg: None,
        }
    }

    #[test]
    fn target_phase_overrides_final_angle() {
        let spec = resolve_pulse_spec(&pulse_config(Some(PI))).unwrap();
        assert!(spec.theta_final > PI / 3.0 && spec.theta_final < PI);
        assert_eq!(resolve_pulse_spec(&pulse_config(None)).unwrap().theta_final, PI / 3.0);
    }

    #[test]
    fn unreachable_phase_is_out_of_range() {
        let err = resolve_pulse_spec(&pulse_config(Some(1e6))).unwrap_err();
        assert!(matches!(err, CalibError::OutOfRange { .. }));
    }

    #[test]
    fn linear_calibration_source() {
        let cal = load_calibration(&pulse_config(None).calibration).unwrap();
        assert_eq!(cal.amplitude_to_frequency(0.0), 5.0);
    }
}
