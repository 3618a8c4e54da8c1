//! Piecewise-linear interpolation on a strictly increasing grid.
//!
//! Out-of-range behavior is explicit (`Fill`) because the pulse code relies on
//! it in two different ways: the phase derivative is zero-filled, while the
//! rescaled z-profile holds its boundary value.

/// What to return for queries outside `[x_first, x_last]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// A fixed value on both sides.
    Value(f64),
    /// The nearest boundary sample.
    Boundary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    fill: Fill,
}

impl Interp1d {
    /// Build an interpolant. Returns `None` unless `xs` is strictly increasing,
    /// non-empty and the same length as `ys`.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, fill: Fill) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        if !xs.windows(2).all(|w| w[1] > w[0]) {
            return None;
        }
        Some(Self { xs, ys, fill })
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let (lo, hi) = self.domain();
        if x.is_nan() {
            return f64::NAN;
        }
        if x < lo || x > hi {
            return match self.fill {
                Fill::Value(v) => v,
                Fill::Boundary => {
                    if x < lo {
                        self.ys[0]
                    } else {
                        self.ys[n - 1]
                    }
                }
            };
        }
        if n == 1 {
            return self.ys[0];
        }

        // First index with xs[i] > x; the bracketing segment is [i-1, i].
        let i = self.xs.partition_point(|&v| v <= x).clamp(1, n - 1);
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        let u = (x - x0) / (x1 - x0);
        y0 + u * (y1 - y0)
    }
}

/// `n` evenly spaced points from `start` to `end` (inclusive).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Points `start, start + step, ...` strictly below `end` (half-open, like
/// `arange`), produced lazily so fine resamplings of long traces stay cheap.
pub fn arange(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let n = if step > 0.0 && end > start {
        ((end - start) / step).ceil() as usize
    } else {
        0
    };
    (0..n).map(move |i| start + step * i as f64).filter(move |&v| v < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_samples() {
        let f = Interp1d::new(vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 6.0], Fill::Value(0.0)).unwrap();
        assert!((f.eval(0.5) - 1.0).abs() < 1e-12);
        assert!((f.eval(2.0) - 4.0).abs() < 1e-12);
        assert_eq!(f.eval(3.0), 6.0);
        assert_eq!(f.eval(0.0), 0.0);
    }

    #[test]
    fn fill_modes_outside_domain() {
        let xs = vec![1.0, 2.0];
        let ys = vec![10.0, 20.0];
        let zero = Interp1d::new(xs.clone(), ys.clone(), Fill::Value(-1.0)).unwrap();
        assert_eq!(zero.eval(0.0), -1.0);
        assert_eq!(zero.eval(5.0), -1.0);

        let edge = Interp1d::new(xs, ys, Fill::Boundary).unwrap();
        assert_eq!(edge.eval(0.0), 10.0);
        assert_eq!(edge.eval(5.0), 20.0);
    }

    #[test]
    fn rejects_unsorted_grid() {
        assert!(Interp1d::new(vec![0.0, 0.0], vec![1.0, 2.0], Fill::Boundary).is_none());
        assert!(Interp1d::new(vec![], vec![], Fill::Boundary).is_none());
    }

    #[test]
    fn linspace_hits_endpoints() {
        let v = linspace(-5.0, 5.0, 100);
        assert_eq!(v.len(), 100);
        assert_eq!(v[0], -5.0);
        assert_eq!(v[99], 5.0);
    }

    #[test]
    fn arange_is_half_open() {
        let v: Vec<f64> = arange(0.0, 1.0, 0.25).collect();
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(arange(1.0, 0.0, 0.25).count(), 0);
        assert_eq!(arange(0.0, 1.0, 0.0).count(), 0);
    }

    #[test]
    fn arange_streams_long_ranges() {
        // Ten million points: only the iterator state is held in memory.
        let mut points = arange(0.0, 1.0, 1e-7);
        assert_eq!(points.next(), Some(0.0));
        assert_eq!(points.size_hint().1, Some(9_999_999));
        let last = points.last().unwrap();
        assert!((last - (1.0 - 1e-7)).abs() < 1e-12, "{last}");
    }
}
