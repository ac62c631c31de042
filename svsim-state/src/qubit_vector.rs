//! Dense state vector storage
//!
//! [`QubitVector`] holds all `2^n` amplitudes in one `Vec<Complex64>` and
//! implements every [`AmplitudeStore`] kernel on top of the traversal
//! framework in [`crate::lambda`]. Gates on one to five qubits use stack
//! index blocks; larger gates use [`IndexBlock`](crate::indexes::IndexBlock).

use crate::backend::{AmplitudeStore, Rotation};
use crate::error::{Result, StateError};
use crate::indexes::{indexes, sorted, QubitList, BITS, MASKS};
use crate::lambda::{
    apply_lambda, apply_lambda_fixed, apply_lambda_gap, apply_lambda_qubits, apply_reduction_lambda,
    apply_reduction_lambda_qubits, dispatch,
};
use crate::pauli::PauliMasks;
use crate::view::AmplitudeView;
use num_complex::Complex64;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use svsim_core::{matrix, Matrix};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Default number of qubits bucketed by the multi-shot sampler index
pub const DEFAULT_SAMPLE_INDEX_SIZE: usize = 10;

type Cache = SmallVec<[Complex64; 32]>;

/// Hex label for a basis state, e.g. `0x5`
pub fn hex_key(index: u64) -> String {
    format!("{:#x}", index)
}

/// Zero out real and imaginary parts below `threshold` in magnitude
pub fn chop(z: Complex64, threshold: f64) -> Complex64 {
    let re = if z.re.abs() < threshold { 0.0 } else { z.re };
    let im = if z.im.abs() < threshold { 0.0 } else { z.im };
    Complex64::new(re, im)
}

/// Visit index blocks, using stack storage for blocks of up to five qubits
fn for_each_block<F>(size: u64, threads: usize, qubits: &[usize], func: F)
where
    F: Fn(&[u64]) + Send + Sync,
{
    match *qubits {
        [q0] => apply_lambda_fixed::<1, 2, _>(0, size, threads, [q0], |inds| func(&inds[..])),
        [q0, q1] => {
            apply_lambda_fixed::<2, 4, _>(0, size, threads, [q0, q1], |inds| func(&inds[..]))
        }
        [q0, q1, q2] => {
            apply_lambda_fixed::<3, 8, _>(0, size, threads, [q0, q1, q2], |inds| func(&inds[..]))
        }
        [q0, q1, q2, q3] => apply_lambda_fixed::<4, 16, _>(
            0,
            size,
            threads,
            [q0, q1, q2, q3],
            |inds| func(&inds[..]),
        ),
        [q0, q1, q2, q3, q4] => apply_lambda_fixed::<5, 32, _>(
            0,
            size,
            threads,
            [q0, q1, q2, q3, q4],
            |inds| func(&inds[..]),
        ),
        _ => apply_lambda_qubits(0, size, threads, qubits, func),
    }
}

fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(StateError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

fn check_square(mat: &Matrix, dim: usize) -> Result<()> {
    check_dimension(dim, mat.rows())?;
    check_dimension(dim, mat.cols())
}

/// Dense statevector of `num_qubits` qubits
#[derive(Clone, Debug)]
pub struct QubitVector {
    num_qubits: usize,
    data: Vec<Complex64>,
    threads: usize,
    sample_index_size: usize,
}

impl QubitVector {
    /// New state in `|0…0⟩`
    pub fn new(num_qubits: usize) -> Self {
        let mut qv = Self {
            num_qubits: 0,
            data: Vec::new(),
            threads: 1,
            sample_index_size: DEFAULT_SAMPLE_INDEX_SIZE,
        };
        qv.set_num_qubits(num_qubits);
        qv.initialize();
        qv
    }

    /// Wrap an existing amplitude vector
    ///
    /// # Errors
    /// [`StateError::InvalidDimension`] if the length is not a power of two
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> Result<Self> {
        let dimension = amplitudes.len();
        if dimension == 0 || !dimension.is_power_of_two() {
            return Err(StateError::InvalidDimension { dimension });
        }
        Ok(Self {
            num_qubits: dimension.trailing_zeros() as usize,
            data: amplitudes,
            threads: 1,
            sample_index_size: DEFAULT_SAMPLE_INDEX_SIZE,
        })
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.set_threads(threads);
        self
    }

    /// Bucket size (in qubits) used by [`AmplitudeStore::sample_measure`]
    pub fn set_sample_index_size(&mut self, size: usize) {
        self.sample_index_size = size.min(63);
    }

    /// Number of amplitudes
    #[inline]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    fn sample_one(&self, rnd: f64, totals: &[f64], stride: u64) -> u64 {
        let end = self.size();
        let mut p = 0.0;
        let mut sample = 0u64;
        for &t in totals {
            if rnd < p + t {
                break;
            }
            p += t;
            sample += stride;
        }
        while sample + 1 < end {
            p += self.probability(sample);
            if rnd < p {
                break;
            }
            sample += 1;
        }
        sample.min(end.saturating_sub(1))
    }
}

impl AmplitudeStore for QubitVector {
    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn set_num_qubits(&mut self, num_qubits: usize) {
        self.num_qubits = num_qubits;
        self.data = vec![ZERO; 1usize << num_qubits];
    }

    fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn initialize(&mut self) {
        self.data.fill(ZERO);
        if let Some(first) = self.data.first_mut() {
            *first = ONE;
        }
    }

    fn initialize_from_vector(&mut self, amplitudes: &[Complex64]) -> Result<()> {
        check_dimension(self.data.len(), amplitudes.len())?;
        self.data.copy_from_slice(amplitudes);
        Ok(())
    }

    fn initialize_component(&mut self, qubits: &[usize], state: &[Complex64]) -> Result<()> {
        check_dimension(1usize << qubits.len(), state.len())?;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            let base = view.get(inds[0]);
            for (&idx, &amp) in inds.iter().zip(state) {
                view.set(idx, base * amp);
            }
        });
        Ok(())
    }

    fn apply_mcx(&mut self, qubits: &[usize]) {
        let n = qubits.len();
        if n == 0 {
            return;
        }
        let pos0 = MASKS[n - 1] as usize;
        let pos1 = MASKS[n] as usize;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            view.swap(inds[pos0], inds[pos1]);
        });
    }

    fn apply_mcy(&mut self, qubits: &[usize]) {
        let n = qubits.len();
        if n == 0 {
            return;
        }
        let pos0 = MASKS[n - 1] as usize;
        let pos1 = MASKS[n] as usize;
        let i = Complex64::i();
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            let a0 = view.get(inds[pos0]);
            let a1 = view.get(inds[pos1]);
            view.set(inds[pos0], -i * a1);
            view.set(inds[pos1], i * a0);
        });
    }

    fn apply_mcphase(&mut self, qubits: &[usize], phase: Complex64) {
        let pos = MASKS[qubits.len()] as usize;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            view.scale(inds[pos], phase);
        });
    }

    fn apply_mcswap(&mut self, qubits: &[usize]) {
        let n = qubits.len();
        if n < 2 {
            return;
        }
        let pos0 = MASKS[n - 1] as usize;
        let pos1 = pos0 + BITS[n - 2] as usize;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            view.swap(inds[pos0], inds[pos1]);
        });
    }

    fn apply_mcu(&mut self, qubits: &[usize], mat: &Matrix) -> Result<()> {
        check_square(mat, 2)?;
        let n = qubits.len();
        if n == 0 {
            return Ok(());
        }
        let pos0 = MASKS[n - 1] as usize;
        let pos1 = MASKS[n] as usize;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        if mat.is_diagonal(0.0) {
            let (d0, d1) = (mat[(0, 0)], mat[(1, 1)]);
            for_each_block(size, threads, qubits, |inds| unsafe {
                if d0 != ONE {
                    view.scale(inds[pos0], d0);
                }
                view.scale(inds[pos1], d1);
            });
        } else {
            let (m00, m01, m10, m11) = (mat[(0, 0)], mat[(0, 1)], mat[(1, 0)], mat[(1, 1)]);
            for_each_block(size, threads, qubits, |inds| unsafe {
                let a0 = view.get(inds[pos0]);
                let a1 = view.get(inds[pos1]);
                view.set(inds[pos0], m00 * a0 + m01 * a1);
                view.set(inds[pos1], m10 * a0 + m11 * a1);
            });
        }
        Ok(())
    }

    fn apply_rotation(&mut self, qubits: &[usize], rotation: Rotation, theta: f64) -> Result<()> {
        if rotation.is_two_qubit() {
            check_dimension(2, qubits.len())?;
        }
        match rotation {
            Rotation::X => self.apply_mcu(qubits, &matrix::rx(theta)),
            Rotation::Y => self.apply_mcu(qubits, &matrix::ry(theta)),
            Rotation::Z => self.apply_mcu(qubits, &Matrix::from_diagonal(&matrix::rz_diag(theta))),
            Rotation::XX => self.apply_matrix(qubits, &matrix::rxx(theta)),
            Rotation::YY => self.apply_matrix(qubits, &matrix::ryy(theta)),
            Rotation::ZZ => self.apply_diagonal_matrix(qubits, &matrix::rzz_diag(theta)),
            Rotation::ZX => self.apply_matrix(qubits, &matrix::rzx(theta)),
        }
    }

    fn apply_matrix(&mut self, qubits: &[usize], mat: &Matrix) -> Result<()> {
        check_square(mat, 1usize << qubits.len())?;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        apply_lambda_gap(0, size, 1, threads, qubits, mat, |inds, m| unsafe {
            let cache: Cache = inds.iter().map(|&i| view.get(i)).collect();
            for (row, &idx) in inds.iter().enumerate() {
                let mut acc = ZERO;
                for (col, &amp) in cache.iter().enumerate() {
                    acc += m[(row, col)] * amp;
                }
                view.set(idx, acc);
            }
        });
        Ok(())
    }

    fn apply_diagonal_matrix(&mut self, qubits: &[usize], diag: &[Complex64]) -> Result<()> {
        check_dimension(1usize << qubits.len(), diag.len())?;
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        for_each_block(size, threads, qubits, |inds| unsafe {
            for (&idx, &d) in inds.iter().zip(diag) {
                if d != ONE {
                    view.scale(idx, d);
                }
            }
        });
        Ok(())
    }

    fn apply_multiplexer(
        &mut self,
        controls: &[usize],
        targets: &[usize],
        stacked: &Matrix,
    ) -> Result<()> {
        let cols = 1usize << targets.len();
        let blocks = 1usize << controls.len();
        check_dimension(cols, stacked.cols())?;
        check_dimension(cols * blocks, stacked.rows())?;
        let qubits: QubitList = targets.iter().chain(controls).copied().collect();
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        apply_lambda_gap(0, size, 1, threads, &qubits, stacked, |inds, m| unsafe {
            let cache: Cache = inds.iter().map(|&i| view.get(i)).collect();
            for b in 0..blocks {
                for i in 0..cols {
                    let row = i + b * cols;
                    let mut acc = ZERO;
                    for j in 0..cols {
                        acc += m[(row, j)] * cache[b * cols + j];
                    }
                    view.set(inds[row], acc);
                }
            }
        });
        Ok(())
    }

    fn apply_pauli(&mut self, qubits: &[usize], pauli: &str) -> Result<()> {
        let masks = PauliMasks::new(qubits, pauli)?;
        if masks.is_identity() {
            return Ok(());
        }
        let (size, threads) = (self.size(), self.threads);
        let view = AmplitudeView::new(&mut self.data);
        match masks.x_max() {
            None => apply_lambda(0, size, threads, |k| unsafe {
                if masks.sign(k) < 0.0 {
                    view.scale(k, -ONE);
                }
            }),
            Some(x_max) => {
                let phase = masks.phase();
                apply_lambda_gap(0, size, 1, threads, &[x_max], &masks, |inds, m| unsafe {
                    let idx0 = inds[0];
                    let idx1 = idx0 ^ m.x_mask;
                    let a0 = view.get(idx0);
                    let a1 = view.get(idx1);
                    view.set(idx0, phase * m.sign(idx1) * a1);
                    view.set(idx1, phase * m.sign(idx0) * a0);
                });
            }
        }
        Ok(())
    }

    fn probabilities(&self, qubits: &[usize]) -> Vec<f64> {
        let n = qubits.len();
        if n == 0 {
            return vec![self.norm()];
        }
        let (size, threads) = (self.size(), self.threads);
        let data = &self.data;
        if n == 1 {
            let p = apply_reduction_lambda_qubits(0, size, threads, qubits, |inds, p0, p1| {
                *p0 += data[inds[0] as usize].norm_sqr();
                *p1 += data[inds[1] as usize].norm_sqr();
            });
            return vec![p.re, p.im];
        }
        let qubits_sorted = sorted(qubits);
        if n == self.num_qubits && qubits_sorted.as_slice() == qubits {
            return dispatch(
                threads,
                || data.par_iter().map(|a| a.norm_sqr()).collect(),
                || data.iter().map(|a| a.norm_sqr()).collect(),
            );
        }
        let dim = 1usize << n;
        let end = size >> n;
        let accumulate = |mut acc: Vec<f64>, k: u64| {
            let inds = indexes(qubits, &qubits_sorted, k);
            for (m, &i) in inds.iter().enumerate() {
                acc[m] += data[i as usize].norm_sqr();
            }
            acc
        };
        dispatch(
            threads,
            || {
                (0..end)
                    .into_par_iter()
                    .fold(|| vec![0.0; dim], accumulate)
                    .reduce(
                        || vec![0.0; dim],
                        |mut a, b| {
                            a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                            a
                        },
                    )
            },
            || (0..end).fold(vec![0.0; dim], accumulate),
        )
    }

    #[inline]
    fn probability(&self, index: u64) -> f64 {
        self.data[index as usize].norm_sqr()
    }

    #[inline]
    fn amplitude(&self, index: u64) -> Complex64 {
        self.data[index as usize]
    }

    fn norm(&self) -> f64 {
        let data = &self.data;
        apply_reduction_lambda(0, self.size(), self.threads, |k, re, _im| {
            *re += data[k as usize].norm_sqr();
        })
        .re
    }

    fn norm_with_matrix(&self, qubits: &[usize], mat: &Matrix) -> Result<f64> {
        let dim = 1usize << qubits.len();
        check_square(mat, dim)?;
        let data = &self.data;
        let (size, threads) = (self.size(), self.threads);
        let norm = if mat.is_diagonal(0.0) {
            let diag = mat.diagonal();
            apply_reduction_lambda_qubits(0, size, threads, qubits, |inds, re, _im| {
                for (&idx, d) in inds.iter().zip(&diag) {
                    *re += (d * data[idx as usize]).norm_sqr();
                }
            })
        } else {
            apply_reduction_lambda_qubits(0, size, threads, qubits, |inds, re, _im| {
                for row in 0..dim {
                    let mut acc = ZERO;
                    for (col, &idx) in inds.iter().enumerate() {
                        acc += mat[(row, col)] * data[idx as usize];
                    }
                    *re += acc.norm_sqr();
                }
            })
        };
        Ok(norm.re)
    }

    fn expval_pauli(&self, qubits: &[usize], pauli: &str) -> Result<f64> {
        let masks = PauliMasks::new(qubits, pauli)?;
        if masks.is_identity() {
            return Ok(self.norm());
        }
        let data = &self.data;
        let (size, threads) = (self.size(), self.threads);
        let value = match masks.x_max() {
            None => apply_reduction_lambda(0, size, threads, |k, re, _im| {
                *re += masks.sign(k) * data[k as usize].norm_sqr();
            }),
            Some(x_max) => {
                let phase = masks.phase();
                apply_reduction_lambda_qubits(0, size, threads, &[x_max], |inds, re, _im| {
                    let idx0 = inds[0];
                    let idx1 = idx0 ^ masks.x_mask;
                    let a0 = data[idx0 as usize];
                    let a1 = data[idx1 as usize];
                    let v = a0.conj() * phase * masks.sign(idx1) * a1
                        + a1.conj() * phase * masks.sign(idx0) * a0;
                    *re += v.re;
                })
            }
        };
        Ok(value.re)
    }

    fn sample_measure(&self, rnds: &[f64]) -> Vec<u64> {
        let end = self.size();
        let index_size = self.sample_index_size;
        let (totals, stride) = if end < BITS[index_size] {
            (Vec::new(), 1)
        } else {
            let stride = end >> index_size;
            let totals: Vec<f64> = (0..BITS[index_size])
                .map(|i| (0..stride).map(|j| self.probability(stride * i | j)).sum())
                .collect();
            (totals, stride)
        };
        dispatch(
            self.threads,
            || rnds.par_iter().map(|&r| self.sample_one(r, &totals, stride)).collect(),
            || rnds.iter().map(|&r| self.sample_one(r, &totals, stride)).collect(),
        )
    }

    fn copy_to_vector(&self) -> Vec<Complex64> {
        self.data.clone()
    }

    fn move_to_vector(&mut self) -> Vec<Complex64> {
        self.num_qubits = 0;
        std::mem::take(&mut self.data)
    }

    fn vector_ket(&self, threshold: f64) -> BTreeMap<String, Complex64> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, &amp)| {
                let value = chop(amp, threshold);
                (value != ZERO).then(|| (hex_key(i as u64), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    fn hadamard() -> Matrix {
        matrix::u4(PI / 2.0, 0.0, PI, 0.0)
    }

    fn random_state(num_qubits: usize, seed: u64) -> QubitVector {
        let mut s = seed;
        let mut next = || {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((s >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        };
        let mut amps: Vec<Complex64> = (0..1usize << num_qubits)
            .map(|_| Complex64::new(next(), next()))
            .collect();
        let norm: f64 = amps.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        amps.iter_mut().for_each(|a| *a /= norm);
        QubitVector::from_amplitudes(amps).unwrap()
    }

    #[test]
    fn test_new_state() {
        let qv = QubitVector::new(3);
        assert_eq!(qv.size(), 8);
        assert_eq!(qv.amplitude(0), ONE);
        assert_relative_eq!(qv.norm(), 1.0);
    }

    #[test]
    fn test_from_amplitudes_rejects_non_power_of_two() {
        assert!(QubitVector::from_amplitudes(vec![ONE; 3]).is_err());
        assert!(QubitVector::from_amplitudes(Vec::new()).is_err());
    }

    #[test]
    fn test_bell_state() {
        let mut qv = QubitVector::new(2);
        qv.apply_mcu(&[0], &hadamard()).unwrap();
        qv.apply_mcx(&[0, 1]);
        assert_relative_eq!(qv.amplitude(0).re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(qv.amplitude(3).re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(qv.probability(1), 0.0, epsilon = 1e-12);
        assert_relative_eq!(qv.probability(2), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mcx_respects_controls() {
        let mut qv = QubitVector::new(3);
        qv.apply_mcx(&[0, 1, 2]);
        assert_eq!(qv.amplitude(0), ONE);
        qv.apply_mcx(&[2]);
        qv.apply_mcx(&[0]);
        qv.apply_mcx(&[2, 0, 1]);
        // controls q2, q0 set -> q1 flipped: |111>
        assert_eq!(qv.amplitude(0b111), ONE);
    }

    #[test]
    fn test_mcy_phase() {
        let mut qv = QubitVector::new(1);
        qv.apply_mcy(&[0]);
        assert_eq!(qv.amplitude(1), Complex64::i());
        qv.apply_mcy(&[0]);
        assert_eq!(qv.amplitude(0), ONE);
    }

    #[test]
    fn test_mcswap() {
        let mut qv = QubitVector::new(3);
        qv.apply_mcx(&[1]);
        qv.apply_mcswap(&[1, 2]);
        assert_eq!(qv.amplitude(0b100), ONE);
        // control q0 is 0, swap must not fire
        qv.apply_mcswap(&[0, 1, 2]);
        assert_eq!(qv.amplitude(0b100), ONE);
    }

    #[test]
    fn test_mcphase_only_all_ones() {
        let mut qv = random_state(3, 7);
        let before = qv.copy_to_vector();
        qv.apply_mcphase(&[0, 2], -ONE);
        for (i, (a, b)) in before.iter().zip(qv.as_slice()).enumerate() {
            let expected = if i & 0b101 == 0b101 { -a } else { *a };
            assert_eq!(*b, expected);
        }
    }

    #[test]
    fn test_matrix_matches_mcu_for_single_qubit() {
        let mut a = random_state(4, 1);
        let mut b = a.clone();
        let u = matrix::u4(0.3, 1.2, -0.7, 0.1);
        a.apply_mcu(&[2], &u).unwrap();
        b.apply_matrix(&[2], &u).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!((x - y).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matrix_dimension_mismatch() {
        let mut qv = QubitVector::new(2);
        let err = qv.apply_matrix(&[0, 1], &hadamard()).unwrap_err();
        assert_eq!(err, StateError::DimensionMismatch { expected: 4, actual: 2 });
        assert!(qv.apply_diagonal_matrix(&[0], &[ONE]).is_err());
    }

    #[test]
    fn test_diagonal_matches_dense() {
        let mut a = random_state(3, 3);
        let mut b = a.clone();
        let diag = vec![ONE, Complex64::i(), -ONE, Complex64::new(0.6, 0.8)];
        a.apply_diagonal_matrix(&[2, 0], &diag).unwrap();
        b.apply_matrix(&[2, 0], &Matrix::from_diagonal(&diag)).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!((x - y).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotations() {
        let mut qv = QubitVector::new(2);
        qv.apply_rotation(&[0], Rotation::X, PI).unwrap();
        assert_relative_eq!(qv.probability(1), 1.0, epsilon = 1e-12);
        qv.apply_rotation(&[0, 1], Rotation::XX, PI).unwrap();
        assert_relative_eq!(qv.probability(2), 1.0, epsilon = 1e-12);
        assert!(qv.apply_rotation(&[0], Rotation::ZZ, 0.1).is_err());
    }

    #[test]
    fn test_multiplexer_selects_by_control() {
        // control q1, target q0: apply I when q1=0, X when q1=1
        let stacked = Matrix::stacked(&[Matrix::identity(2), matrix::x()]).unwrap();
        let mut qv = QubitVector::new(2);
        qv.apply_multiplexer(&[1], &[0], &stacked).unwrap();
        assert_eq!(qv.amplitude(0), ONE);
        qv.apply_mcx(&[1]);
        qv.apply_multiplexer(&[1], &[0], &stacked).unwrap();
        assert_eq!(qv.amplitude(0b11), ONE);
        assert!(qv.apply_multiplexer(&[1], &[0], &matrix::x()).is_err());
    }

    #[test]
    fn test_pauli_matches_matrices() {
        let base = random_state(3, 11);
        let mut a = base.clone();
        a.apply_pauli(&[0, 2], "YX").unwrap();
        let mut b = base.clone();
        b.apply_matrix(&[0], &matrix::x()).unwrap();
        b.apply_matrix(&[2], &matrix::y()).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!((x - y).norm(), 0.0, epsilon = 1e-12);
        }
        let mut c = base.clone();
        c.apply_pauli(&[1], "Z").unwrap();
        let mut d = base;
        d.apply_matrix(&[1], &matrix::z()).unwrap();
        assert_eq!(c.as_slice(), d.as_slice());
    }

    #[test]
    fn test_expval_pauli() {
        let mut qv = QubitVector::new(2);
        assert_relative_eq!(qv.expval_pauli(&[0], "Z").unwrap(), 1.0);
        qv.apply_mcu(&[0], &hadamard()).unwrap();
        assert_relative_eq!(qv.expval_pauli(&[0], "X").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(qv.expval_pauli(&[0], "Z").unwrap(), 0.0, epsilon = 1e-12);
        qv.apply_mcx(&[0, 1]);
        assert_relative_eq!(qv.expval_pauli(&[0, 1], "XX").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(qv.expval_pauli(&[0, 1], "YY").unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(qv.expval_pauli(&[0, 1], "ZZ").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_probabilities_marginal() {
        let qv = random_state(4, 5);
        let full = qv.probabilities(&[0, 1, 2, 3]);
        let marg = qv.probabilities(&[3, 1]);
        assert_eq!(marg.len(), 4);
        for (m, p) in marg.iter().enumerate() {
            let expected: f64 = (0..16usize)
                .filter(|&i| ((i >> 3) & 1) == (m & 1) && ((i >> 1) & 1) == (m >> 1))
                .map(|i| full[i])
                .sum();
            assert_relative_eq!(*p, expected, epsilon = 1e-12);
        }
        assert_relative_eq!(qv.probabilities(&[2]).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(qv.probabilities(&[])[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_apply_is_bit_exact() {
        let base = random_state(8, 21);
        let mut seq = base.clone();
        let mut par = base.with_threads(4);
        for qv in [&mut seq, &mut par] {
            qv.apply_mcu(&[3], &hadamard()).unwrap();
            qv.apply_mcx(&[3, 6]);
            qv.apply_matrix(&[1, 5, 2], &Matrix::identity(8).scaled(Complex64::i())).unwrap();
            qv.apply_pauli(&[0, 7], "XY").unwrap();
        }
        assert_eq!(seq.as_slice(), par.as_slice());
        assert_relative_eq!(seq.norm(), par.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_norm_with_matrix() {
        let mut qv = QubitVector::new(1);
        qv.apply_mcu(&[0], &hadamard()).unwrap();
        let mut proj0 = Matrix::zeros(2, 2);
        proj0[(0, 0)] = ONE;
        assert_relative_eq!(qv.norm_with_matrix(&[0], &proj0).unwrap(), 0.5, epsilon = 1e-12);
        let mut lower = Matrix::zeros(2, 2);
        lower[(0, 1)] = ONE;
        assert_relative_eq!(qv.norm_with_matrix(&[0], &lower).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_initialize_component() {
        let mut qv = QubitVector::new(2);
        qv.apply_mcx(&[0]);
        let plus = [Complex64::new(FRAC_1_SQRT_2, 0.0); 2];
        qv.initialize_component(&[1], &plus).unwrap();
        assert_relative_eq!(qv.amplitude(0b01).re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(qv.amplitude(0b11).re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert!(qv.initialize_component(&[1], &[ONE]).is_err());
    }

    #[test]
    fn test_sample_measure_small_and_bucketed() {
        let mut qv = QubitVector::new(3);
        qv.apply_mcx(&[1]);
        assert_eq!(qv.sample_measure(&[0.0, 0.5, 0.999]), vec![2, 2, 2]);
        qv.set_sample_index_size(1);
        assert_eq!(qv.sample_measure(&[0.0, 0.5, 0.999]), vec![2, 2, 2]);

        let mut plus = QubitVector::new(1);
        plus.apply_mcu(&[0], &hadamard()).unwrap();
        assert_eq!(plus.sample_measure(&[0.25, 0.75]), vec![0, 1]);
        // deviates at or past the total mass fall on the last outcome
        assert_eq!(plus.sample_measure(&[1.0]), vec![1]);
    }

    #[test]
    fn test_vector_ket_and_move() {
        let mut qv = QubitVector::new(2);
        qv.apply_mcx(&[1]);
        let ket = qv.vector_ket(1e-10);
        assert_eq!(ket.len(), 1);
        assert_eq!(ket["0x2"], ONE);
        let v = qv.move_to_vector();
        assert_eq!(v.len(), 4);
        assert_eq!(qv.num_qubits(), 0);
    }
}
