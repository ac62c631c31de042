//! Dense complex matrices and the standard gate matrices used by the dispatcher
//!
//! Matrices are stored row-major. Gate matrices follow the little-endian qubit
//! convention: row/column index bit `i` corresponds to the `i`-th listed qubit.

use crate::error::{CoreError, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::ops::{Index, IndexMut};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Row-major dense complex matrix
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl Matrix {
    /// Create a matrix from a row-major element buffer
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidMatrix`] if `data.len() != rows * cols`
    pub fn new(rows: usize, cols: usize, data: Vec<Complex64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(CoreError::invalid_matrix(rows, cols, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from a list of rows
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidMatrix`] if the rows are ragged
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let data: Vec<Complex64> = rows.into_iter().flatten().collect();
        Self::new(nrows, ncols, data)
    }

    /// All-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![ZERO; rows * cols],
        }
    }

    /// Identity matrix of dimension `dim`
    pub fn identity(dim: usize) -> Self {
        Self::from_diagonal(&vec![ONE; dim])
    }

    /// Square matrix with `diag` on its diagonal
    pub fn from_diagonal(diag: &[Complex64]) -> Self {
        let dim = diag.len();
        let mut mat = Self::zeros(dim, dim);
        for (i, &d) in diag.iter().enumerate() {
            mat[(i, i)] = d;
        }
        mat
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major element buffer
    #[inline]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Number of qubits a square `2^n x 2^n` matrix acts on
    pub fn num_qubits(&self) -> Option<usize> {
        if self.is_square() && self.rows.is_power_of_two() {
            Some(self.rows.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// True if every off-diagonal element has magnitude at most `threshold`
    ///
    /// Non-square matrices are never diagonal.
    pub fn is_diagonal(&self, threshold: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        for r in 0..self.rows {
            for c in 0..self.cols {
                if r != c && self[(r, c)].norm() > threshold {
                    return false;
                }
            }
        }
        true
    }

    /// Main diagonal as a vector
    pub fn diagonal(&self) -> Vec<Complex64> {
        (0..self.rows.min(self.cols)).map(|i| self[(i, i)]).collect()
    }

    /// Matrix multiplied by a scalar
    pub fn scaled(&self, factor: Complex64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&z| z * factor).collect(),
        }
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        let mut adj = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                adj[(c, r)] = self[(r, c)].conj();
            }
        }
        adj
    }

    /// Matrix product `self * rhs`
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidOperation`] if the inner dimensions differ
    pub fn matmul(&self, rhs: &Matrix) -> Result<Self> {
        if self.cols != rhs.rows {
            return Err(CoreError::InvalidOperation(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }
        let mut out = Self::zeros(self.rows, rhs.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(r, k)];
                if a == ZERO {
                    continue;
                }
                for c in 0..rhs.cols {
                    out[(r, c)] += a * rhs[(k, c)];
                }
            }
        }
        Ok(out)
    }

    /// Largest elementwise distance to `other`, or infinity if shapes differ
    pub fn max_deviation(&self, other: &Matrix) -> f64 {
        if self.rows != other.rows || self.cols != other.cols {
            return f64::INFINITY;
        }
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Stack equally shaped matrices vertically
    ///
    /// The result has `mats.len() * rows` rows, block `b` holding `mats[b]`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidOperation`] if the list is empty or shapes differ
    pub fn stacked(mats: &[Matrix]) -> Result<Self> {
        let first = mats
            .first()
            .ok_or_else(|| CoreError::InvalidOperation("cannot stack an empty matrix list".into()))?;
        let (rows, cols) = (first.rows, first.cols);
        if let Some(bad) = mats.iter().find(|m| m.rows != rows || m.cols != cols) {
            return Err(CoreError::InvalidOperation(format!(
                "stacked matrices must share a shape: {}x{} vs {}x{}",
                rows, cols, bad.rows, bad.cols
            )));
        }
        let data = mats.iter().flat_map(|m| m.data.iter().copied()).collect();
        Ok(Self {
            rows: rows * mats.len(),
            cols,
            data,
        })
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Complex64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Complex64 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Complex64 {
        &mut self.data[row * self.cols + col]
    }
}

fn mat2(m00: Complex64, m01: Complex64, m10: Complex64, m11: Complex64) -> Matrix {
    Matrix {
        rows: 2,
        cols: 2,
        data: vec![m00, m01, m10, m11],
    }
}

/// Pauli X
pub fn x() -> Matrix {
    mat2(ZERO, ONE, ONE, ZERO)
}

/// Pauli Y
pub fn y() -> Matrix {
    mat2(ZERO, -I, I, ZERO)
}

/// Pauli Z
pub fn z() -> Matrix {
    mat2(ONE, ZERO, ZERO, -ONE)
}

/// General single-qubit unitary with global phase
///
/// ```text
/// e^{iγ} [[cos(θ/2),          -e^{iλ} sin(θ/2)     ],
///         [e^{iφ} sin(θ/2),    e^{i(φ+λ)} cos(θ/2)]]
/// ```
pub fn u4(theta: f64, phi: f64, lambda: f64, gamma: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    mat2(
        Complex64::from_polar(c, gamma),
        -Complex64::from_polar(s, lambda + gamma),
        Complex64::from_polar(s, phi + gamma),
        Complex64::from_polar(c, phi + lambda + gamma),
    )
}

/// `u4` without global phase
pub fn u3(theta: f64, phi: f64, lambda: f64) -> Matrix {
    u4(theta, phi, lambda, 0.0)
}

/// Rotation by `theta` about the axis `cos(φ) X + sin(φ) Y`
pub fn r(theta: f64, phi: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    let off = -I * s;
    mat2(
        Complex64::new(c, 0.0),
        off * Complex64::from_polar(1.0, -phi),
        off * Complex64::from_polar(1.0, phi),
        Complex64::new(c, 0.0),
    )
}

/// Square root of X
pub fn sx() -> Matrix {
    let p = Complex64::new(0.5, 0.5);
    let m = Complex64::new(0.5, -0.5);
    mat2(p, m, m, p)
}

/// Inverse square root of X
pub fn sxdg() -> Matrix {
    let p = Complex64::new(0.5, 0.5);
    let m = Complex64::new(0.5, -0.5);
    mat2(m, p, p, m)
}

/// `exp(-iθX/2)`
pub fn rx(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    mat2(real(c), Complex64::new(0.0, -s), Complex64::new(0.0, -s), real(c))
}

/// `exp(-iθY/2)`
pub fn ry(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    mat2(real(c), real(-s), real(s), real(c))
}

/// Diagonal of `exp(-iθZ/2)`
pub fn rz_diag(theta: f64) -> Vec<Complex64> {
    vec![
        Complex64::from_polar(1.0, -theta / 2.0),
        Complex64::from_polar(1.0, theta / 2.0),
    ]
}

/// `exp(-iθ X⊗X/2)`
pub fn rxx(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    let mut m = Matrix::from_diagonal(&[real(c); 4]);
    let off = Complex64::new(0.0, -s);
    for i in 0..4 {
        m[(i, 3 - i)] = off;
    }
    m
}

/// `exp(-iθ Y⊗Y/2)`
pub fn ryy(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    let mut m = Matrix::from_diagonal(&[real(c); 4]);
    m[(0, 3)] = Complex64::new(0.0, s);
    m[(3, 0)] = Complex64::new(0.0, s);
    m[(1, 2)] = Complex64::new(0.0, -s);
    m[(2, 1)] = Complex64::new(0.0, -s);
    m
}

/// Diagonal of `exp(-iθ Z⊗Z/2)`
pub fn rzz_diag(theta: f64) -> Vec<Complex64> {
    let even = Complex64::from_polar(1.0, -theta / 2.0);
    let odd = Complex64::from_polar(1.0, theta / 2.0);
    vec![even, odd, odd, even]
}

/// `exp(-iθ Z⊗X/2)` with Z on the first qubit (bit 0) and X on the second (bit 1)
pub fn rzx(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    let mut m = Matrix::from_diagonal(&[real(c); 4]);
    m[(0, 2)] = Complex64::new(0.0, -s);
    m[(2, 0)] = Complex64::new(0.0, -s);
    m[(1, 3)] = Complex64::new(0.0, s);
    m[(3, 1)] = Complex64::new(0.0, s);
    m
}

#[inline]
fn real(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// Echoed cross-resonance gate
pub fn ecr() -> Matrix {
    let a = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let b = Complex64::new(0.0, FRAC_1_SQRT_2);
    Matrix {
        rows: 4,
        cols: 4,
        data: vec![
            ZERO, a, ZERO, b, //
            a, ZERO, -b, ZERO, //
            ZERO, b, ZERO, a, //
            -b, ZERO, a, ZERO,
        ],
    }
}
