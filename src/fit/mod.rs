//! Curve fitting.
//!
//! Responsibilities:
//!
//! - Levenberg–Marquardt solver (`lm`)
//! - automatic sinusoid initial guess and FFT spectrum (`guess`)
//! - public fit routines per model (`fitter`)
//! - parallel batch fitting (`batch`)

pub mod batch;
pub mod fitter;
pub mod guess;
pub mod lm;

pub use batch::*;
pub use fitter::*;
pub use guess::*;
pub use lm::*;
