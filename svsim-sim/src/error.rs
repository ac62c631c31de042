//! Error types for operation execution

use svsim_core::CoreError;
use svsim_state::StateError;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Errors raised while applying an operation to the state
///
/// Every variant is raised at the point of detection and aborts the
/// enclosing circuit. Nothing is retried and a partially applied update is
/// not rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Unknown instruction or gate name
    #[error("Unsupported instruction: {name}")]
    UnsupportedInstruction { name: String },

    /// Qubit count inconsistent with a matrix, diagonal or full-state requirement
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Noise channel that cannot be sampled
    #[error("Invalid noise model: {reason}")]
    InvalidNoiseModel { reason: String },

    /// Operation payload missing or malformed
    #[error("Invalid parameters for {op}: {reason}")]
    InvalidParameters { op: String, reason: String },

    /// Amplitude storage error
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Core type error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl ExecutionError {
    pub fn unsupported(name: impl Into<String>) -> Self {
        ExecutionError::UnsupportedInstruction { name: name.into() }
    }

    pub fn invalid_parameters(op: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecutionError::InvalidParameters {
            op: op.into(),
            reason: reason.into(),
        }
    }

    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        ExecutionError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// All execution errors abort the circuit
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Short machine-friendly category name
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::UnsupportedInstruction { .. } => "unsupported_instruction",
            ExecutionError::DimensionMismatch { .. } => "dimension_mismatch",
            ExecutionError::InvalidNoiseModel { .. } => "invalid_noise_model",
            ExecutionError::InvalidParameters { .. } => "invalid_parameters",
            ExecutionError::State(StateError::DimensionMismatch { .. }) => "dimension_mismatch",
            ExecutionError::State(_) => "state",
            ExecutionError::Core(_) => "core",
        }
    }
}
