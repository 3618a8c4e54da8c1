//! Error kinds shared by the fitting and pulse-shaping code.
//!
//! Every failure is raised synchronously and carries enough context to be
//! printed directly by the binary. The binary maps each kind to an exit code:
//!
//! - `2`: bad input, usage or I/O
//! - `3`: not enough data for the requested model
//! - `4`: numerical failure (convergence, domain, lookup range)

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CalibError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibError {
    /// Fewer samples than free parameters.
    #[error("Insufficient data: need at least {required} samples, got {provided}")]
    InsufficientData { required: usize, provided: usize },

    /// The optimizer exhausted its evaluation budget.
    #[error("Fit did not converge after {iterations} evaluations (cost = {cost:.6e})")]
    Convergence { iterations: usize, cost: f64 },

    /// A mathematically undefined intermediate value.
    #[error("Domain error: {0}")]
    Domain(String),

    /// A requested value lies outside a precomputed lookup table.
    #[error("Value {value} is outside the invertible range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// Malformed arguments (length mismatch, non-monotonic x, wrong arity, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File system or serialization failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl CalibError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CalibError::InvalidInput(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        CalibError::Domain(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        CalibError::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            CalibError::InvalidInput(_) | CalibError::Io(_) => 2,
            CalibError::InsufficientData { .. } => 3,
            CalibError::Convergence { .. } | CalibError::Domain(_) | CalibError::OutOfRange { .. } => 4,
        }
    }
}
