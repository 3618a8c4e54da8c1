//! SVG export via Plotters.
//!
//! Same data as the ASCII plots, rendered to a file for reports. Bounds are
//! computed before drawing so the drawing code only draws.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{FitResult, Series};
use crate::error::{CalibError, Result};
use crate::models::predict;
use crate::pulse::Waveform;

/// A render-only chart description.
pub struct SvgChart<'a> {
    pub caption: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Drawn as a line.
    pub curve: &'a [(f64, f64)],
    /// Drawn as small circles.
    pub points: &'a [(f64, f64)],
}

impl SvgChart<'_> {
    fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut xs = [f64::INFINITY, f64::NEG_INFINITY];
        let mut ys = [f64::INFINITY, f64::NEG_INFINITY];
        for &(x, y) in self.curve.iter().chain(self.points) {
            if x.is_finite() && y.is_finite() {
                xs = [xs[0].min(x), xs[1].max(x)];
                ys = [ys[0].min(y), ys[1].max(y)];
            }
        }
        if !(xs[1] > xs[0]) {
            return None;
        }
        let pad = ((ys[1] - ys[0]).abs() * 0.05).max(1e-12);
        Some((xs, [ys[0] - pad, ys[1] + pad]))
    }

    /// Render to `path` at `width`×`height` pixels.
    pub fn write(&self, path: &Path, width: u32, height: u32) -> Result<()> {
        let ([x0, x1], [y0, y1]) = self
            .bounds()
            .ok_or_else(|| CalibError::invalid("nothing to plot: empty or degenerate x range"))?;

        let root = SVGBackend::new(path, (width, height)).into_drawing_area();
        let draw = || -> std::result::Result<(), Box<dyn std::error::Error>> {
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(&root)
                .caption(self.caption, ("sans-serif", 18))
                .margin(10)
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(8)
                .y_labels(6)
                .draw()?;

            chart.draw_series(LineSeries::new(self.curve.iter().copied(), &BLUE))?;
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, BLACK.filled())),
            )?;
            root.present()?;
            Ok(())
        };
        draw().map_err(|e| CalibError::io(format!("Failed to write SVG '{}': {e}", path.display())))
    }
}

/// Measured points plus the fitted model.
pub fn write_fit_svg(path: &Path, series: &Series, fit: &FitResult, width: u32, height: u32) -> Result<()> {
    let (x_min, x_max) = series
        .x_range()
        .ok_or_else(|| CalibError::invalid("cannot plot an empty series"))?;
    let n = (width as usize).max(2);
    let curve: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / (n - 1) as f64;
            (x, predict(fit.model, x, &fit.params))
        })
        .collect();
    let points: Vec<(f64, f64)> = series.x().iter().copied().zip(series.y().iter().copied()).collect();
    SvgChart {
        caption: fit.model.display_name(),
        x_label: "x",
        y_label: "y",
        curve: &curve,
        points: &points,
    }
    .write(path, width, height)
}

/// Control amplitude of a generated pulse.
pub fn write_waveform_svg(path: &Path, waveform: &Waveform<'_>, dt: f64, width: u32, height: u32) -> Result<()> {
    let curve = waveform.render(dt)?;
    SvgChart {
        caption: "STA pulse",
        x_label: "t",
        y_label: "amplitude",
        curve: &curve,
        points: &[],
    }
    .write(path, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_svg_document() {
        let curve: Vec<(f64, f64)> = (0..50).map(|i| (i as f64, (i as f64 * 0.2).sin())).collect();
        let path = std::env::temp_dir().join(format!("czcal-{}-chart.svg", std::process::id()));
        SvgChart {
            caption: "test",
            x_label: "x",
            y_label: "y",
            curve: &curve,
            points: &curve[..5],
        }
        .write(&path, 320, 240)
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.contains("<svg"));
    }

    #[test]
    fn degenerate_range_is_rejected() {
        let chart = SvgChart {
            caption: "flat",
            x_label: "x",
            y_label: "y",
            curve: &[(1.0, 1.0)],
            points: &[],
        };
        assert!(chart.write(Path::new("unused.svg"), 100, 100).is_err());
    }
}
