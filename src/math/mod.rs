//! Mathematical utilities: least squares, interpolation, quadrature and FFT.

pub mod interp;
pub mod ols;
pub mod quad;
pub mod spectrum;

pub use interp::*;
pub use ols::*;
pub use quad::*;
pub use spectrum::*;
