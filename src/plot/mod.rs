//! Plot rendering: ASCII for the terminal (`ascii`), SVG files (`svg`).

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
