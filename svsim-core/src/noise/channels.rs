//! Implementations of common single-qubit noise channels

use super::{check_probability, NoiseChannel};
use crate::error::{CoreError, Result};
use crate::matrix::{self, Matrix};
use crate::operation::Op;
use num_complex::Complex64;

fn real(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// Depolarizing noise channel
///
/// With probability `p` a uniformly random Pauli error (X, Y or Z) hits the qubit.
///
/// # Kraus Operators
/// ```text
/// K₀ = √(1-p) I
/// K₁ = √(p/3) X
/// K₂ = √(p/3) Y
/// K₃ = √(p/3) Z
/// ```
///
/// # Example
/// ```
/// # use svsim_core::noise::{DepolarizingChannel, NoiseChannel};
/// let channel = DepolarizingChannel::new(0.01).unwrap();
/// assert_eq!(channel.kraus_operators().len(), 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DepolarizingChannel {
    error_probability: f64,
}

impl DepolarizingChannel {
    /// # Errors
    /// Returns [`CoreError::InvalidProbability`] if `p` is not in [0, 1]
    pub fn new(error_probability: f64) -> Result<Self> {
        Ok(Self {
            error_probability: check_probability(error_probability)?,
        })
    }

    pub fn error_probability(&self) -> f64 {
        self.error_probability
    }
}

impl NoiseChannel for DepolarizingChannel {
    fn kraus_operators(&self) -> Vec<Matrix> {
        let p = self.error_probability;
        let keep = real((1.0 - p).sqrt());
        let flip = real((p / 3.0).sqrt());
        vec![
            Matrix::identity(2).scaled(keep),
            matrix::x().scaled(flip),
            matrix::y().scaled(flip),
            matrix::z().scaled(flip),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "depolarizing"
    }
}

/// Bit-flip channel: X with probability `p`
#[derive(Debug, Clone, Copy)]
pub struct BitFlip {
    p: f64,
}

impl BitFlip {
    pub fn new(p: f64) -> Result<Self> {
        Ok(Self {
            p: check_probability(p)?,
        })
    }
}

impl NoiseChannel for BitFlip {
    fn kraus_operators(&self) -> Vec<Matrix> {
        vec![
            Matrix::identity(2).scaled(real((1.0 - self.p).sqrt())),
            matrix::x().scaled(real(self.p.sqrt())),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "bit_flip"
    }
}

/// Phase-flip channel: Z with probability `p`
#[derive(Debug, Clone, Copy)]
pub struct PhaseFlip {
    p: f64,
}

impl PhaseFlip {
    pub fn new(p: f64) -> Result<Self> {
        Ok(Self {
            p: check_probability(p)?,
        })
    }
}

impl NoiseChannel for PhaseFlip {
    fn kraus_operators(&self) -> Vec<Matrix> {
        vec![
            Matrix::identity(2).scaled(real((1.0 - self.p).sqrt())),
            matrix::z().scaled(real(self.p.sqrt())),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "phase_flip"
    }
}

/// Amplitude damping channel (T1 relaxation)
///
/// # Kraus Operators
/// ```text
/// K₀ = [[1, 0], [0, √(1-γ)]]
/// K₁ = [[0, √γ], [0, 0]]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AmplitudeDamping {
    gamma: f64,
}

impl AmplitudeDamping {
    /// # Errors
    /// Returns [`CoreError::InvalidProbability`] if `gamma` is not in [0, 1]
    pub fn new(gamma: f64) -> Result<Self> {
        Ok(Self {
            gamma: check_probability(gamma)?,
        })
    }

    /// Decay over `gate_time` for a qubit with relaxation time `t1`:
    /// `γ = 1 - exp(-gate_time / t1)`
    pub fn from_t1(t1: f64, gate_time: f64) -> Result<Self> {
        if t1 <= 0.0 || gate_time < 0.0 {
            return Err(CoreError::InvalidOperation(format!(
                "T1 must be positive and gate time non-negative (t1={}, gate_time={})",
                t1, gate_time
            )));
        }
        Self::new(1.0 - (-gate_time / t1).exp())
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl NoiseChannel for AmplitudeDamping {
    fn kraus_operators(&self) -> Vec<Matrix> {
        let mut k0 = Matrix::identity(2);
        k0[(1, 1)] = real((1.0 - self.gamma).sqrt());
        let mut k1 = Matrix::zeros(2, 2);
        k1[(0, 1)] = real(self.gamma.sqrt());
        vec![k0, k1]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "amplitude_damping"
    }
}

/// Phase damping channel (pure dephasing)
///
/// # Kraus Operators
/// ```text
/// K₀ = √(1-λ) I
/// K₁ = √λ Z
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PhaseDamping {
    lambda: f64,
}

impl PhaseDamping {
    /// # Errors
    /// Returns [`CoreError::InvalidProbability`] if `lambda` is not in [0, 1]
    pub fn new(lambda: f64) -> Result<Self> {
        Ok(Self {
            lambda: check_probability(lambda)?,
        })
    }

    /// `λ = (1 - exp(-gate_time / t2)) / 2`
    pub fn from_t2(t2: f64, gate_time: f64) -> Result<Self> {
        if t2 <= 0.0 || gate_time < 0.0 {
            return Err(CoreError::InvalidOperation(format!(
                "T2 must be positive and gate time non-negative (t2={}, gate_time={})",
                t2, gate_time
            )));
        }
        Self::new((1.0 - (-gate_time / t2).exp()) / 2.0)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl NoiseChannel for PhaseDamping {
    fn kraus_operators(&self) -> Vec<Matrix> {
        vec![
            Matrix::identity(2).scaled(real((1.0 - self.lambda).sqrt())),
            matrix::z().scaled(real(self.lambda.sqrt())),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "phase_damping"
    }
}

/// Classical readout error on a single measured bit
///
/// Not a Kraus channel: it rewrites the stored memory value through a
/// `roerror` operation.
#[derive(Debug, Clone, Copy)]
pub struct ReadoutError {
    /// P(read 1 | stored 0)
    p01: f64,
    /// P(read 0 | stored 1)
    p10: f64,
}

impl ReadoutError {
    pub fn new(p01: f64, p10: f64) -> Result<Self> {
        Ok(Self {
            p01: check_probability(p01)?,
            p10: check_probability(p10)?,
        })
    }

    pub fn symmetric(error_rate: f64) -> Result<Self> {
        Self::new(error_rate, error_rate)
    }

    /// Outcome distribution per stored value: row `m` is `P(read · | stored m)`
    pub fn probability_table(&self) -> Vec<Vec<f64>> {
        vec![vec![1.0 - self.p01, self.p01], vec![self.p10, 1.0 - self.p10]]
    }

    /// Readout-error operation on memory bit `memory`
    pub fn to_op(&self, memory: usize) -> Op {
        Op::roerror(&[memory], self.probability_table())
    }
}
