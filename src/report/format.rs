//! Formatted terminal output.
//!
//! All formatting lives here so the numerical code never prints and output
//! changes stay localized.

use crate::domain::{FitResult, PulseSpec, Series, Spectrum};
use crate::io::RowError;
use crate::pulse::{PhaseLookup, Waveform};
use crate::report::Residual;
use crate::sequence::Schedule;

/// Fit summary: data range, parameters and quality.
pub fn format_fit_summary(series: &Series, fit: &FitResult, source: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== czcal - {} fit ===\n", fit.model.display_name()));
    if let Some(source) = source {
        out.push_str(&format!("Source: {source}\n"));
    }
    let (x_min, x_max) = series.x_range().unwrap_or((f64::NAN, f64::NAN));
    out.push_str(&format!("Points: n={} | x=[{x_min:.4}, {x_max:.4}]\n", series.len()));

    out.push_str("\nParameters:\n");
    for ((name, value), guess) in fit
        .model
        .param_names()
        .iter()
        .zip(&fit.params)
        .zip(&fit.initial_guess)
    {
        out.push_str(&format!("- {name:<10} {value:>14.6}   (guess {guess:.6})\n"));
    }

    out.push_str(&format!(
        "\nQuality: SSE={:.6e} RMSE={:.6e} evaluations={}\n",
        fit.quality.sse, fit.quality.rmse, fit.quality.iterations
    ));
    if let Some(spectrum) = &fit.spectrum {
        out.push_str(&format_spectrum_summary(spectrum));
    }
    out
}

pub fn format_spectrum_summary(spectrum: &Spectrum) -> String {
    let df = spectrum
        .frequencies
        .windows(2)
        .next()
        .map(|w| (w[1] - w[0]).abs())
        .unwrap_or(f64::NAN);
    format!(
        "Spectrum: {} bins | resolution={df:.6e} | peak frequency={:.6}\n",
        spectrum.frequencies.len(),
        spectrum.peak_frequency
    )
}

/// Skipped CSV rows, capped at `max` lines.
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Skipped rows: {}\n", errors.len()));
    for e in errors.iter().take(max) {
        out.push_str(&format!("  line {:>5}: {}\n", e.line, e.message));
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

/// Table of the largest residuals.
pub fn format_residual_table(rows: &[Residual]) -> String {
    let mut out = String::new();
    out.push_str("Largest residuals:\n");
    out.push_str(format!("{:>6} {:>12} {:>14} {:>14} {:>14}", "index", "x", "y_obs", "y_fit", "residual").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<12} {:-<14} {:-<14} {:-<14}", "", "", "", "", "").trim_end());
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{:>6} {:>12.4} {:>14.6} {:>14.6} {:>14.6}\n",
            r.index, r.x, r.y_obs, r.y_fit, r.residual
        ));
    }
    out
}

/// Pulse parameters and the resulting support.
pub fn format_pulse_summary(spec: &PulseSpec, waveform: &Waveform<'_>, gate_length: Option<f64>) -> String {
    let mut out = String::new();
    out.push_str("=== czcal - STA pulse ===\n");
    out.push_str(&format!(
        "Ramp: t0={:.3} T={:.3} G={:.6} theta_final={:.6} samples={}\n",
        spec.start, spec.duration, spec.coupling, spec.theta_final, spec.samples
    ));
    out.push_str(&format!(
        "Target frequency: {:.6} | nonlinearity: {:.6} | return trip: {}\n",
        spec.target_frequency,
        spec.nonlinearity,
        if spec.return_trip { "yes" } else { "no" }
    ));
    let (lo, hi) = waveform.support();
    out.push_str(&format!(
        "Support: ({lo:.4}, {hi:.4}) | rescaled length={:.6}\n",
        waveform.support_len()
    ));
    if let Some(len) = gate_length {
        out.push_str(&format!("Gate length (round trip): {len:.6}\n"));
    }
    let z = waveform.z();
    let (z_min, z_max) = z
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
    out.push_str(&format!("Detuning z: [{z_min:.6}, {z_max:.6}]\n"));
    out
}

/// Result of a phase-to-angle lookup.
pub fn format_phase_result(lookup: &PhaseLookup, phase: f64, theta_final: f64) -> String {
    let (lo, hi) = lookup.range();
    format!(
        "T={:.3} G={:.6}: phase {phase:.6} -> theta_final {theta_final:.6} rad ({:.3}π) | table range [{lo:.4}, {hi:.4}]\n",
        lookup.duration(),
        lookup.coupling(),
        theta_final / std::f64::consts::PI
    )
}

/// One line per placed gate, then per-qubit totals.
pub fn format_schedule(schedule: &Schedule) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<6} {:<8} {:>10} {:>10} {:>12}", "gate", "qubits", "start", "length", "drive_phase").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<8} {:-<10} {:-<10} {:-<12}", "", "", "", "", "").trim_end());
    out.push('\n');
    for op in &schedule.ops {
        let qubits: Vec<String> = op.qubits.iter().map(|q| q.to_string()).collect();
        let phase = op.drive_phase.map(|p| format!("{p:.4}")).unwrap_or_default();
        out.push_str(
            format!(
                "{:<6} {:<8} {:>10.3} {:>10.3} {:>12}",
                op.gate.name(),
                qubits.join(","),
                op.start,
                op.duration,
                phase
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!("\nTotal duration: {:.3}\n", schedule.duration()));
    out.push_str(&format!("Frame phases: {}\n", fmt_vec(&schedule.xy_phases)));
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
