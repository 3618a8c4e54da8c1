//! Model implementations.
//!
//! Models are implemented as small, pure functions so that the solver can
//! stay generic over the model family.

pub mod model;

pub use model::*;
