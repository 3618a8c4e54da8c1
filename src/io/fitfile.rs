//! Read/write saved fits (JSON).
//!
//! A fit file is the portable record of one fit: the input trace, the model
//! and parameters, quality numbers and, for sinusoids, the spectrum. The
//! schema is `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{FitFile, FitResult, Series};
use crate::error::{CalibError, Result};

pub const TOOL_NAME: &str = "czcal";

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, series: &Series, result: &FitResult, source: Option<&Path>) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| CalibError::io(format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    let record = FitFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now(),
        source: source.map(|p| p.display().to_string()),
        series: series.clone(),
        result: result.clone(),
    };
    serde_json::to_writer_pretty(file, &record)
        .map_err(|e| CalibError::io(format!("Failed to write fit JSON: {e}")))
}

/// Read a fit JSON file, re-validating the stored series and parameters.
pub fn read_fit_json(path: &Path) -> Result<FitFile> {
    let file = File::open(path)
        .map_err(|e| CalibError::io(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let record: FitFile =
        serde_json::from_reader(file).map_err(|e| CalibError::io(format!("Invalid fit JSON: {e}")))?;

    let series = Series::new(record.series.x().to_vec(), record.series.y().to_vec())?;
    if record.result.params.len() != record.result.model.arity() {
        return Err(CalibError::invalid(format!(
            "fit JSON has {} parameters for model `{}` (expected {})",
            record.result.params.len(),
            record.result.model.display_name(),
            record.result.model.arity()
        )));
    }
    Ok(FitFile { series, ..record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{FitOptions, fit_exponential};
    use crate::math::linspace;
    use crate::models::predict_all;
    use crate::domain::ModelKind;

    #[test]
    fn saved_fit_reads_back() {
        let x = linspace(0.0, 3.0, 30);
        let y = predict_all(ModelKind::Exponential, &x, &[2.0, -0.7]);
        let series = Series::new(x, y).unwrap();
        let result = fit_exponential(&series, None, &FitOptions::default()).unwrap();

        let path = std::env::temp_dir().join(format!("czcal-{}-fit.json", std::process::id()));
        write_fit_json(&path, &series, &result, Some(Path::new("trace.csv"))).unwrap();
        let back = read_fit_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.tool, TOOL_NAME);
        assert_eq!(back.source.as_deref(), Some("trace.csv"));
        assert_eq!(back.series, series);
        assert_eq!(back.result.model, ModelKind::Exponential);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_fit_json(Path::new("/nonexistent/czcal.json")).unwrap_err();
        assert!(matches!(err, CalibError::Io(_)));
    }
}
