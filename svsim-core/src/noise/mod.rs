//! Kraus-operator noise channels
//!
//! Each channel produces a list of Kraus matrices `{K_i}` satisfying
//! `Σ K_i† K_i = I`. The simulator samples exactly one branch per application,
//! so the list order matters only for which operator is inferred from the
//! remaining probability (the last one).
//!
//! # Usage
//!
//! ```
//! use svsim_core::noise::{AmplitudeDamping, NoiseChannel};
//!
//! let damping = AmplitudeDamping::new(0.02).unwrap();
//! let op = damping.to_op(&[0]).unwrap();
//! assert_eq!(op.mats.len(), 2);
//! ```

pub mod channels;

pub use channels::{
    AmplitudeDamping, BitFlip, DepolarizingChannel, PhaseDamping, PhaseFlip, ReadoutError,
};

use crate::error::{CoreError, Result};
use crate::matrix::Matrix;
use crate::operation::Op;
use std::fmt;

/// Default tolerance for the completeness check
pub const COMPLETENESS_TOLERANCE: f64 = 1e-10;

/// A quantum channel described by Kraus operators
pub trait NoiseChannel: Send + Sync + fmt::Debug {
    /// Kraus operators of the channel, each `2^n x 2^n`
    fn kraus_operators(&self) -> Vec<Matrix>;

    /// Number of qubits the channel acts on
    fn num_qubits(&self) -> usize;

    fn name(&self) -> &str;

    /// Check `Σ K_i† K_i = I` within `tolerance`
    ///
    /// # Errors
    /// Returns [`CoreError::IncompleteChannel`] with the largest elementwise deviation
    fn verify_completeness(&self, tolerance: f64) -> Result<()> {
        verify_completeness(&self.kraus_operators(), tolerance)
    }

    /// Build a Kraus operation applying this channel to `qubits`
    fn to_op(&self, qubits: &[usize]) -> Result<Op> {
        if qubits.len() != self.num_qubits() {
            return Err(CoreError::InvalidOperation(format!(
                "{} acts on {} qubit(s), got {}",
                self.name(),
                self.num_qubits(),
                qubits.len()
            )));
        }
        let mats = self.kraus_operators();
        verify_completeness(&mats, COMPLETENESS_TOLERANCE)?;
        let mut op = Op::kraus(qubits, mats);
        op.name = self.name().to_string();
        Ok(op)
    }
}

/// Check `Σ K_i† K_i = I` for an arbitrary Kraus list
///
/// An empty list is never complete.
pub fn verify_completeness(kraus: &[Matrix], tolerance: f64) -> Result<()> {
    let first = kraus.first().ok_or(CoreError::IncompleteChannel {
        deviation: f64::INFINITY,
    })?;
    let dim = first.rows();
    let mut sum = Matrix::zeros(dim, dim);
    for k in kraus {
        let term = k.adjoint().matmul(k)?;
        if term.rows() != dim || term.cols() != dim {
            return Err(CoreError::invalid_matrix(dim, dim, term.data().len()));
        }
        for r in 0..dim {
            for c in 0..dim {
                sum[(r, c)] += term[(r, c)];
            }
        }
    }
    let deviation = sum.max_deviation(&Matrix::identity(dim));
    if deviation > tolerance {
        return Err(CoreError::IncompleteChannel { deviation });
    }
    Ok(())
}

pub(crate) fn check_probability(p: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(CoreError::InvalidProbability(p))
    }
}
