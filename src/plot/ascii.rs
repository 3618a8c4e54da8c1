//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, meant for quick sanity checks of a fit or a
//! pulse shape straight from the terminal. Output is deterministic.
//!
//! Plot elements:
//! - measured points: `o`
//! - fitted / generated curve: `-` line
//! - spectrum peak: `^`

use crate::domain::{FitResult, Series, Spectrum};
use crate::models::predict;
use crate::pulse::Waveform;

/// Measured points with the fitted model drawn through them.
pub fn render_fit_plot(series: &Series, fit: &FitResult, width: usize, height: usize) -> String {
    let (x_min, x_max) = series.x_range().filter(|(a, b)| b > a).unwrap_or((0.0, 1.0));
    let points: Vec<(f64, f64)> = series.x().iter().copied().zip(series.y().iter().copied()).collect();
    let curve = sample_curve(|x| predict(fit.model, x, &fit.params), x_min, x_max, width.max(2) * 4);
    render_plot(&points, Some(&curve), None, x_min, x_max, width, height)
}

/// FFT magnitude against frequency, with the peak marked.
pub fn render_spectrum_plot(spectrum: &Spectrum, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = spectrum
        .frequencies
        .iter()
        .copied()
        .zip(spectrum.magnitudes.iter().copied())
        .collect();
    let (f_min, f_max) = x_range(&curve).unwrap_or((-1.0, 1.0));
    let peak = curve
        .iter()
        .copied()
        .filter(|&(f, _)| f >= 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    render_plot(&[], Some(&curve), peak, f_min, f_max, width, height)
}

/// Control amplitude over the waveform support.
pub fn render_waveform_plot(waveform: &Waveform<'_>, width: usize, height: usize) -> String {
    let (t_min, t_max) = waveform.support();
    let curve = sample_curve(|t| waveform.amplitude_at(t), t_min, t_max, width.max(2) * 4);
    render_plot(&[], Some(&curve), None, t_min, t_max, width, height)
}

fn render_plot(
    points: &[(f64, f64)],
    curve: Option<&[(f64, f64)]>,
    marker: Option<(f64, f64)>,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let all = points.iter().chain(curve.unwrap_or(&[]));
    let (y_min, y_max) = value_range(all.map(|&(_, y)| y)).unwrap_or((0.0, 1.0));
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    let mut canvas = Canvas::new(width.max(10), height.max(5), (x_min, x_max), (y_min - pad, y_max + pad));
    // Curve first so points and the marker overlay it.
    if let Some(curve) = curve {
        canvas.polyline(curve, '-');
    }
    for &(x, y) in points {
        canvas.put(x, y, 'o');
    }
    if let Some((x, y)) = marker {
        canvas.put(x, y, '^');
    }
    canvas.render()
}

fn x_range(curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    value_range(curve.iter().map(|&(x, _)| x))
}

/// `(min, max)` of the finite values, `None` when the range is empty or flat.
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (hi > lo).then_some((lo, hi))
}

fn sample_curve(f: impl Fn(f64) -> f64, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let step = (x_max - x_min) / (n - 1) as f64;
    (0..n)
        .map(|i| x_min + step * i as f64)
        .map(|x| (x, f(x)))
        .filter(|(_, y)| y.is_finite())
        .collect()
}

/// Character grid with data coordinates mapped onto cells. Row 0 is the top.
struct Canvas {
    cells: Vec<Vec<char>>,
    x: (f64, f64),
    y: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            x,
            y,
        }
    }

    fn width(&self) -> usize {
        self.cells[0].len()
    }

    fn height(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        let col = scale(x, self.x, self.width());
        let row = self.height() - 1 - scale(y, self.y, self.height());
        (col, row)
    }

    fn put(&mut self, x: f64, y: f64, ch: char) {
        let (col, row) = self.cell(x, y);
        self.cells[row][col] = ch;
    }

    /// Connect consecutive points; only blank cells are written after the
    /// first point.
    fn polyline(&mut self, curve: &[(f64, f64)], ch: char) {
        if curve.len() < 2 {
            return;
        }
        let cells: Vec<(usize, usize)> = curve.iter().map(|&(x, y)| self.cell(x, y)).collect();
        let (c0, r0) = cells[0];
        self.cells[r0][c0] = ch;
        for pair in cells.windows(2) {
            self.segment(pair[0], pair[1], ch);
        }
    }

    /// Bresenham segment between two cells.
    fn segment(&mut self, from: (usize, usize), to: (usize, usize), ch: char) {
        let (mut c, mut r) = (from.0 as isize, from.1 as isize);
        let (c1, r1) = (to.0 as isize, to.1 as isize);
        let dc = (c1 - c).abs();
        let dr = -(r1 - r).abs();
        let step_c = if c < c1 { 1 } else { -1 };
        let step_r = if r < r1 { 1 } else { -1 };
        let mut err = dc + dr;

        loop {
            let cell = &mut self.cells[r as usize][c as usize];
            if *cell == ' ' {
                *cell = ch;
            }
            if c == c1 && r == r1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dr {
                err += dr;
                c += step_c;
            }
            if e2 <= dc {
                err += dc;
                r += step_r;
            }
        }
    }

    fn render(self) -> String {
        let mut out = format!(
            "Plot: x=[{:.3}, {:.3}] | y=[{:.4}, {:.4}]\n",
            self.x.0, self.x.1, self.y.0, self.y.1
        );
        for row in self.cells {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

/// Cell index of `v` within `range` on an axis of `cells` cells, clamped.
fn scale(v: f64, range: (f64, f64), cells: usize) -> usize {
    let u = ((v - range.0) / (range.1 - range.0)).clamp(0.0, 1.0);
    (u * (cells - 1) as f64).round() as usize
}
