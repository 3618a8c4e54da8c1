//! Gate names and two-qubit schedule construction.

pub mod gate;
pub mod schedule;

pub use gate::*;
pub use schedule::*;
