//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - validated sample series (`Series`)
//! - model kinds and fit outputs (`ModelKind`, `FitResult`, `Spectrum`, ...)
//! - pulse configuration (`PulseSpec`)
//! - run configurations built from CLI flags (`FitConfig`, `PulseConfig`)

pub mod types;

pub use types::*;
