//! Numerical integration: adaptive Simpson quadrature and running sums.

/// Maximum bisection depth for adaptive Simpson.
const MAX_DEPTH: u32 = 48;

/// Integrate `f` over `[a, b]` with adaptive Simpson's rule.
///
/// Returns `None` if the integrand produces a non-finite value or the
/// requested tolerance cannot be met within the depth limit.
pub fn integrate<F>(f: F, a: f64, b: f64, tol: f64) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return Some(0.0);
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    if !(fa.is_finite() && fb.is_finite() && fm.is_finite()) {
        return None;
    }
    let whole = simpson(a, b, fa, fm, fb);
    adaptive(&f, a, b, fa, fm, fb, whole, tol.max(f64::EPSILON), MAX_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adaptive<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    if !(flm.is_finite() && frm.is_finite()) {
        return None;
    }
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if delta.abs() <= 15.0 * tol {
        // Richardson extrapolation of the two Simpson estimates.
        return Some(left + right + delta / 15.0);
    }
    if depth == 0 {
        return None;
    }
    let l = adaptive(f, a, m, fa, flm, fm, left, tol / 2.0, depth - 1)?;
    let r = adaptive(f, m, b, fm, frm, fb, right, tol / 2.0, depth - 1)?;
    Some(l + r)
}

/// Running sum: `out[i] = values[0] + ... + values[i]`.
pub fn cumsum(values: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    values
        .iter()
        .map(|v| {
            acc += v;
            acc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn integrates_smooth_functions() {
        let v = integrate(|x| x.sin(), 0.0, PI, 1e-12).unwrap();
        assert!((v - 2.0).abs() < 1e-10, "{v}");

        let v = integrate(|x| x * x, -1.0, 2.0, 1e-12).unwrap();
        assert!((v - 3.0).abs() < 1e-12, "{v}");
    }

    #[test]
    fn reports_non_finite_integrand() {
        assert!(integrate(|x| 1.0 / x, 0.0, 1.0, 1e-8).is_none());
    }

    #[test]
    fn cumsum_accumulates() {
        assert_eq!(cumsum(&[1.0, 2.0, 3.0]), vec![1.0, 3.0, 6.0]);
        assert!(cumsum(&[]).is_empty());
    }
}
