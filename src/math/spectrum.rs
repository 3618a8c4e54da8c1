//! Discrete Fourier helpers (numpy-compatible conventions).
//!
//! - `fft_magnitude` zero-pads (or truncates) the input to `nfft` points
//! - `fftfreq` returns bin frequencies in "standard" order (DC, positive, negative)
//! - `fftshift` reorders a standard-order array so negative frequencies come first

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Magnitude of the `nfft`-point DFT of `values`.
///
/// Shorter inputs are zero-padded; longer inputs are truncated to the first
/// `nfft` samples.
pub fn fft_magnitude(values: &[f64], nfft: usize) -> Vec<f64> {
    if nfft == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let mut buf = vec![Complex::new(0.0, 0.0); nfft];
    for (dst, src) in buf.iter_mut().zip(values.iter().copied()) {
        *dst = Complex::new(src, 0.0);
    }
    fft.process(&mut buf);
    buf.iter().map(|c| c.norm()).collect()
}

/// Sample frequencies for an `n`-point DFT with sample spacing `d`.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * d);
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * scale
            } else {
                (k as f64 - n as f64) * scale
            }
        })
        .collect()
}

/// Move the zero-frequency bin to the center.
pub fn fftshift<T: Clone>(values: &[T]) -> Vec<T> {
    let n = values.len();
    let split = n.div_ceil(2);
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&values[split..]);
    out.extend_from_slice(&values[..split]);
    out
}

/// Index of the first maximum (NaNs never win).
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if values[b] >= v => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn fftfreq_matches_numpy_layout() {
        assert_eq!(fftfreq(4, 1.0), vec![0.0, 0.25, -0.5, -0.25]);
        assert_eq!(fftfreq(5, 1.0), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn fftshift_centers_zero_bin() {
        assert_eq!(fftshift(&[0, 1, 2, -2, -1]), vec![-2, -1, 0, 1, 2]);
        assert_eq!(fftshift(&[0, 1, -2, -1]), vec![-2, -1, 0, 1]);
    }

    #[test]
    fn pure_tone_peaks_at_its_bin() {
        let n = 64;
        let y: Vec<f64> = (0..n).map(|i| (2.0 * PI * 8.0 * i as f64 / n as f64).cos()).collect();
        let mag = fft_magnitude(&y, n);
        let k = argmax(&mag).unwrap();
        assert!(k == 8 || k == n - 8, "peak at {k}");
        assert!((mag[8] - n as f64 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn argmax_prefers_first_and_skips_nan() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 0.5]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
