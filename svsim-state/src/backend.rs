//! Interface between the simulator state and amplitude storage
//!
//! The dispatcher decides *which* qubits and matrices an operation needs;
//! an [`AmplitudeStore`] performs the elementwise work. Qubit indices are
//! validated by the caller before any of these methods run.
//!
//! Controlled operations treat the last listed qubit as the target (the last
//! two for swap); every other listed qubit is a control that must read 1.

use crate::error::Result;
use num_complex::Complex64;
use std::collections::BTreeMap;
use svsim_core::Matrix;

/// Parametrized rotation axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    X,
    Y,
    Z,
    XX,
    YY,
    ZZ,
    /// Z on the first listed qubit, X on the second
    ZX,
}

impl Rotation {
    /// Two-qubit rotations act on exactly two qubits and take no controls
    pub fn is_two_qubit(self) -> bool {
        matches!(self, Rotation::XX | Rotation::YY | Rotation::ZZ | Rotation::ZX)
    }
}

/// Dense amplitude storage driven by the simulator state
pub trait AmplitudeStore: Send {
    fn num_qubits(&self) -> usize;

    /// Resize to `num_qubits` qubits; contents are unspecified until initialized
    fn set_num_qubits(&mut self, num_qubits: usize);

    /// Worker count used by subsequent kernels
    fn set_threads(&mut self, threads: usize);

    fn threads(&self) -> usize;

    /// Reset to `|0…0⟩`
    fn initialize(&mut self);

    /// Replace all amplitudes
    fn initialize_from_vector(&mut self, amplitudes: &[Complex64]) -> Result<()>;

    /// Tensor `state` onto `qubits`, which must currently be in `|0⟩`
    fn initialize_component(&mut self, qubits: &[usize], state: &[Complex64]) -> Result<()>;

    /// Multi-controlled X
    fn apply_mcx(&mut self, qubits: &[usize]);

    /// Multi-controlled Y
    fn apply_mcy(&mut self, qubits: &[usize]);

    /// Multiply the all-ones component of `qubits` by `phase`
    fn apply_mcphase(&mut self, qubits: &[usize], phase: Complex64);

    /// Multi-controlled swap of the last two listed qubits
    fn apply_mcswap(&mut self, qubits: &[usize]);

    /// Multi-controlled single-qubit unitary
    fn apply_mcu(&mut self, qubits: &[usize], mat: &Matrix) -> Result<()>;

    fn apply_rotation(&mut self, qubits: &[usize], rotation: Rotation, theta: f64) -> Result<()>;

    /// Dense `2^N x 2^N` unitary
    fn apply_matrix(&mut self, qubits: &[usize], mat: &Matrix) -> Result<()>;

    /// Diagonal of length `2^N`
    fn apply_diagonal_matrix(&mut self, qubits: &[usize], diag: &[Complex64]) -> Result<()>;

    /// Control-selected block unitary
    ///
    /// `stacked` has `2^(c+t)` rows and `2^t` columns; rows
    /// `[b·2^t, (b+1)·2^t)` hold the matrix applied when the controls read `b`.
    fn apply_multiplexer(
        &mut self,
        controls: &[usize],
        targets: &[usize],
        stacked: &Matrix,
    ) -> Result<()>;

    /// Pauli string, big-endian over `qubits`
    fn apply_pauli(&mut self, qubits: &[usize], pauli: &str) -> Result<()>;

    /// Outcome probabilities over `qubits` (little-endian outcome index)
    fn probabilities(&self, qubits: &[usize]) -> Vec<f64>;

    /// `|amplitude(index)|²`
    fn probability(&self, index: u64) -> f64;

    fn amplitude(&self, index: u64) -> Complex64;

    /// Total squared norm
    fn norm(&self) -> f64;

    /// Squared norm of the state after applying `mat` to `qubits`, without mutating it
    fn norm_with_matrix(&self, qubits: &[usize], mat: &Matrix) -> Result<f64>;

    /// `⟨ψ|P|ψ⟩` for a Pauli string on `qubits`
    fn expval_pauli(&self, qubits: &[usize], pauli: &str) -> Result<f64>;

    /// Sample full-register outcomes, one per uniform deviate in `rnds`
    fn sample_measure(&self, rnds: &[f64]) -> Vec<u64>;

    fn copy_to_vector(&self) -> Vec<Complex64>;

    /// Take the amplitudes, leaving an empty zero-qubit store
    fn move_to_vector(&mut self) -> Vec<Complex64>;

    /// Non-negligible amplitudes keyed by hex basis label
    fn vector_ket(&self, threshold: f64) -> BTreeMap<String, Complex64>;
}
