//! Error types for svsim core types

use thiserror::Error;

/// Errors raised while building operations, matrices or noise channels
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Matrix shape does not match its element buffer
    #[error("Invalid matrix: {rows}x{cols} requires {} elements, got {len}", rows * cols)]
    InvalidMatrix { rows: usize, cols: usize, len: usize },

    /// Probability outside [0, 1]
    #[error("Probability must be in [0, 1], got {0}")]
    InvalidProbability(f64),

    /// Kraus set does not satisfy Σ K†K = I
    #[error("Kraus operators are not trace preserving (max deviation {deviation:.3e})")]
    IncompleteChannel { deviation: f64 },

    /// Operation record is malformed
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl CoreError {
    /// Create an invalid matrix error
    pub fn invalid_matrix(rows: usize, cols: usize, len: usize) -> Self {
        Self::InvalidMatrix { rows, cols, len }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_matrix_message() {
        let err = CoreError::invalid_matrix(2, 2, 3);
        let msg = format!("{}", err);
        assert!(msg.contains("2x2"));
        assert!(msg.contains("4 elements"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_invalid_probability_message() {
        let msg = CoreError::InvalidProbability(1.5).to_string();
        assert!(msg.contains("1.5"));
    }
}
