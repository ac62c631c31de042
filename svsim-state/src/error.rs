//! Error types for amplitude storage operations

use thiserror::Error;

/// Errors raised by the amplitude store and its kernels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Qubit index past the end of the register
    #[error("Qubit {index} is out of range for a {num_qubits}-qubit register")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// Amplitude count that is not a power of two
    #[error("{dimension} amplitudes do not form a register, expected a power of 2")]
    InvalidDimension { dimension: usize },

    /// Matrix or vector size differs from `2^|qubits|`
    #[error("Expected {expected} entries, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid Pauli label '{0}', expected one of I, X, Y, Z")]
    InvalidPauli(char),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, StateError>;
