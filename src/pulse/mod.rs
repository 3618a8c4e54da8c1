//! STA pulse shaping.
//!
//! Responsibilities:
//!
//! - frequency/amplitude calibration curves (`calibration`)
//! - closed-form pulse generation and gate length (`sta`)
//! - amplitude queries on the generated pulse (`waveform`)
//! - accumulated conditional phase and its inverse lookup (`phase`)

pub mod calibration;
pub mod phase;
pub mod sta;
pub mod waveform;

pub use calibration::*;
pub use phase::*;
pub use sta::*;
pub use waveform::*;
