//! `czcal` library crate.
//!
//! Numerical core for superconducting-qubit calibration: nonlinear curve
//! fitting with automatic sinusoid guesses, and closed-form adiabatic (STA)
//! pulse shaping for the conditional-phase gate. The `czcal` binary is a thin
//! wrapper so everything here is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod pulse;
pub mod report;
pub mod sequence;
