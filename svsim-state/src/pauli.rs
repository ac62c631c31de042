//! Pauli strings as bit masks
//!
//! A Pauli string over a qubit list is written big-endian: the first character
//! acts on the last listed qubit. Internally the string becomes
//! `P = i^{n_Y} X^x Z^z`, so that
//!
//! ```text
//! P |j⟩ = i^{n_Y} (-1)^{popcount(j & z)} |j ^ x⟩
//! ```

use crate::error::{Result, StateError};
use crate::indexes::BITS;
use num_complex::Complex64;
use std::fmt;

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    /// Parse a Pauli operator from a character
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            other => Err(StateError::InvalidPauli(other)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Mask form of a Pauli string on a specific qubit list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauliMasks {
    /// Qubits flipped by X or Y
    pub x_mask: u64,
    /// Qubits signed by Z or Y
    pub z_mask: u64,
    /// Number of Y factors
    pub num_y: u32,
}

impl PauliMasks {
    /// Parse `pauli` against `qubits`
    ///
    /// # Errors
    /// [`StateError::DimensionMismatch`] if the lengths differ,
    /// [`StateError::InvalidPauli`] on an unknown label.
    pub fn new(qubits: &[usize], pauli: &str) -> Result<Self> {
        let labels: Vec<char> = pauli.chars().collect();
        if labels.len() != qubits.len() {
            return Err(StateError::DimensionMismatch {
                expected: qubits.len(),
                actual: labels.len(),
            });
        }
        let mut masks = Self::default();
        for (i, &q) in qubits.iter().enumerate() {
            let bit = BITS[q];
            match Pauli::from_char(labels[labels.len() - 1 - i])? {
                Pauli::I => {}
                Pauli::X => masks.x_mask |= bit,
                Pauli::Z => masks.z_mask |= bit,
                Pauli::Y => {
                    masks.x_mask |= bit;
                    masks.z_mask |= bit;
                    masks.num_y += 1;
                }
            }
        }
        Ok(masks)
    }

    /// `i^{n_Y}`
    pub fn phase(&self) -> Complex64 {
        match self.num_y & 3 {
            0 => Complex64::new(1.0, 0.0),
            1 => Complex64::new(0.0, 1.0),
            2 => Complex64::new(-1.0, 0.0),
            _ => Complex64::new(0.0, -1.0),
        }
    }

    /// Sign `(-1)^{popcount(index & z)}`
    #[inline]
    pub fn sign(&self, index: u64) -> f64 {
        if (index & self.z_mask).count_ones() & 1 == 1 {
            -1.0
        } else {
            1.0
        }
    }

    /// Position of the highest flipped qubit, if any
    pub fn x_max(&self) -> Option<usize> {
        if self.x_mask == 0 {
            None
        } else {
            Some(63 - self.x_mask.leading_zeros() as usize)
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x_mask == 0 && self.z_mask == 0
    }
}
