//! CSV exports of fitted traces and rendered waveforms.
//!
//! Plain comma-separated files with a header row, easy to pull into a
//! spreadsheet or back into the instrument scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{FitResult, Series};
use crate::error::{CalibError, Result};
use crate::pulse::Waveform;

/// Write `x,y,fit,residual` rows for a fitted series.
pub fn write_fit_csv(path: &Path, series: &Series, result: &FitResult) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "x,y,fit,residual").map_err(write_err)?;
    for ((x, y), fit) in series.x().iter().zip(series.y()).zip(&result.fitted) {
        writeln!(out, "{x:.10},{y:.10},{fit:.10},{:.10}", y - fit).map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}

/// Write the waveform sampled every `dt` as `t,amplitude,z` rows.
pub fn write_waveform_csv(path: &Path, waveform: &Waveform<'_>, dt: f64) -> Result<usize> {
    let points = waveform.render(dt)?;
    let mut out = create(path)?;
    writeln!(out, "t,amplitude,z").map_err(write_err)?;
    for &(t, amp) in &points {
        writeln!(out, "{t:.6},{amp:.10},{:.10}", waveform.detuning_at(t)).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(points.len())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| CalibError::io(format!("Failed to create export '{}': {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

fn write_err(e: std::io::Error) -> CalibError {
    CalibError::io(format!("Failed to write export: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, ModelKind};
    use crate::pulse::LinearCalibration;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("czcal-{}-{name}", std::process::id()))
    }

    #[test]
    fn fit_csv_has_residual_column() {
        let series = Series::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let result = FitResult {
            model: ModelKind::Exponential,
            params: vec![1.0, 0.5],
            initial_guess: vec![1.0, 1.0],
            fitted: vec![1.0, 1.5],
            quality: FitQuality {
                sse: 0.25,
                rmse: 0.35,
                iterations: 4,
                n: 2,
            },
            spectrum: None,
        };
        let path = temp_path("fit.csv");
        write_fit_csv(&path, &series, &result).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x,y,fit,residual");
        assert!(lines[2].ends_with(",0.5000000000"), "{}", lines[2]);
    }

    #[test]
    fn waveform_csv_row_count_matches_render() {
        let cal = LinearCalibration::new(5.0, -1.0).unwrap();
        let spec = crate::domain::PulseSpec {
            target_frequency: 4.9,
            samples: 201,
            ..Default::default()
        };
        let w = crate::pulse::generate(&spec, &cal).unwrap();
        let path = temp_path("wave.csv");
        let n = write_waveform_csv(&path, &w, 0.5).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text.lines().count(), n + 1);
    }
}
