//! Input/output helpers.
//!
//! - CSV ingest of traces and calibration tables (`ingest`)
//! - CSV exports of fits and waveforms (`export`)
//! - fit JSON read/write (`fitfile`)

pub mod export;
pub mod fitfile;
pub mod ingest;

pub use export::*;
pub use fitfile::*;
pub use ingest::*;
