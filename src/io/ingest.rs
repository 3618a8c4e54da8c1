//! CSV ingest of measured traces and calibration tables.
//!
//! Files are expected to have a header row; columns are matched
//! case-insensitively. Bad rows are skipped and reported, never silently
//! dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::domain::Series;
use crate::error::{CalibError, Result};
use crate::pulse::TabulatedCalibration;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the cleaned series plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: Series,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load `(x, y)` columns from a CSV file.
pub fn load_series(path: &Path, x_column: &str, y_column: &str) -> Result<IngestedSeries> {
    let file = open(path)?;
    read_series(file, x_column, y_column)
}

/// Load `(x, y)` columns from any CSV source.
///
/// Rows are sorted by `x`; rows repeating an earlier `x` are reported and
/// skipped so the resulting series is strictly increasing.
pub fn read_series<R: Read>(source: R, x_column: &str, y_column: &str) -> Result<IngestedSeries> {
    let table = read_columns(source, &[x_column, y_column])?;

    let mut rows: Vec<(usize, f64, f64)> = table.rows.into_iter().map(|(line, v)| (line, v[0], v[1])).collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut row_errors = table.row_errors;
    let mut x = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for (line, xi, yi) in rows {
        if x.last() == Some(&xi) {
            row_errors.push(RowError {
                line,
                message: format!("Duplicate x value {xi}"),
            });
            continue;
        }
        x.push(xi);
        y.push(yi);
    }
    row_errors.sort_by_key(|e| e.line);
    for e in &row_errors {
        warn!(line = e.line, "{}", e.message);
    }

    let rows_used = x.len();
    if rows_used == 0 {
        return Err(CalibError::InsufficientData {
            required: 1,
            provided: 0,
        });
    }

    Ok(IngestedSeries {
        series: Series::new(x, y)?,
        row_errors,
        rows_read: table.rows_read,
        rows_used,
    })
}

/// Load an `amplitude,frequency` calibration table.
pub fn load_calibration_table(path: &Path) -> Result<TabulatedCalibration> {
    let file = open(path)?;
    read_calibration_table(file)
}

pub fn read_calibration_table<R: Read>(source: R) -> Result<TabulatedCalibration> {
    let table = read_columns(source, &["amplitude", "frequency"])?;
    for e in &table.row_errors {
        warn!(line = e.line, "{}", e.message);
    }
    TabulatedCalibration::new(table.rows.into_iter().map(|(_, v)| (v[0], v[1])).collect())
}

struct ColumnTable {
    /// `(line, values)` in file order, one value per requested column.
    rows: Vec<(usize, Vec<f64>)>,
    row_errors: Vec<RowError>,
    rows_read: usize,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| CalibError::io(format!("Failed to open CSV '{}': {e}", path.display())))
}

fn read_columns<R: Read>(source: R, columns: &[&str]) -> Result<ColumnTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| CalibError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let indices = columns
        .iter()
        .map(|name| {
            header_map
                .get(&normalize_header_name(name))
                .copied()
                .ok_or_else(|| CalibError::invalid(format!("Missing required column: `{name}`")))
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed: std::result::Result<Vec<f64>, String> = indices
            .iter()
            .zip(columns)
            .map(|(&i, name)| parse_value(&record, i, name))
            .collect();
        match parsed {
            Ok(values) => rows.push((line, values)),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok(ColumnTable {
        rows,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_value(record: &StringRecord, idx: usize, name: &str) -> std::result::Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value: `{name}`"))?;
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid number for `{name}`: '{raw}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value for `{name}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::CalibrationCurve;

    #[test]
    fn reads_named_columns_and_sorts() {
        let csv = "\u{feff}Time,Signal,extra\n2,0.5,a\n0,1.0,b\n1,0.7,c\n";
        let data = read_series(csv.as_bytes(), "time", "signal").unwrap();
        assert_eq!(data.series.x(), &[0.0, 1.0, 2.0]);
        assert_eq!(data.series.y(), &[1.0, 0.7, 0.5]);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.rows_used, 3);
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let csv = "x,y\n0,1\n1,oops\n2,\n3,4\n3,5\n";
        let data = read_series(csv.as_bytes(), "x", "y").unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
    }

    #[test]
    fn missing_column_is_input_error() {
        let err = read_series("a,b\n1,2\n".as_bytes(), "x", "y").unwrap_err();
        assert!(matches!(err, CalibError::InvalidInput(_)));
    }

    #[test]
    fn empty_file_is_insufficient_data() {
        let err = read_series("x,y\n".as_bytes(), "x", "y").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn calibration_table_round_trips() {
        let csv = "amplitude,frequency\n0.0,5.0\n0.1,4.9\n0.2,4.7\n";
        let cal = read_calibration_table(csv.as_bytes()).unwrap();
        assert!((cal.amplitude_to_frequency(0.15) - 4.8).abs() < 1e-12);
        assert!((cal.frequency_to_amplitude(4.8) - 0.15).abs() < 1e-12);
    }
}
