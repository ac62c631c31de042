//! Parallel traversal framework
//!
//! Every kernel in this crate is a closure driven over a reduced index space.
//! For an `N`-qubit list the range `[start, stop >> N)` is walked; each
//! reduced index `k` is resolved to its index block and handed to the closure.
//!
//! With `threads <= 1` the walk runs on the calling thread in ascending `k`.
//! Otherwise it runs on a pool of exactly `threads` workers with no ordering
//! across `k`. Index blocks for distinct `k` are disjoint, which is what lets
//! closures write through an [`AmplitudeView`](crate::view::AmplitudeView)
//! without locking.
//!
//! Reductions accumulate into per-task `(re, im)` pairs that are summed at the
//! end. Summation order varies with the thread count, so results may differ in
//! the last bits between thread counts.

use crate::indexes::{indexes, indexes_fixed, sorted};
use crate::pool::pool;
use num_complex::Complex64;
use rayon::prelude::*;

/// Run `par` inside a pool of `threads` workers, or `seq` inline
pub(crate) fn dispatch<R, P, S>(threads: usize, par: P, seq: S) -> R
where
    R: Send,
    P: FnOnce() -> R + Send,
    S: FnOnce() -> R,
{
    if threads > 1 {
        match pool(threads) {
            Ok(p) => return p.install(par),
            Err(e) => log::warn!("{}; running on the calling thread", e),
        }
    }
    seq()
}

fn sum_pairs(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 + b.0, a.1 + b.1)
}

/// Apply `func` to every full index in `[start, stop)`
pub fn apply_lambda<F>(start: u64, stop: u64, threads: usize, func: F)
where
    F: Fn(u64) + Send + Sync,
{
    dispatch(
        threads,
        || (start..stop).into_par_iter().for_each(&func),
        || (start..stop).for_each(&func),
    )
}

/// Apply `func` to the index block of every reduced index in
/// `[start, stop >> qubits.len())`
pub fn apply_lambda_qubits<F>(start: u64, stop: u64, threads: usize, qubits: &[usize], func: F)
where
    F: Fn(&[u64]) + Send + Sync,
{
    let qubits_sorted = sorted(qubits);
    let end = stop >> qubits.len();
    let visit = |k: u64| func(&indexes(qubits, &qubits_sorted, k));
    dispatch(
        threads,
        || (start..end).into_par_iter().for_each(&visit),
        || (start..end).for_each(&visit),
    )
}

/// Fixed-size variant of [`apply_lambda_qubits`]; blocks live on the stack
///
/// `D` must equal `2^N`.
pub fn apply_lambda_fixed<const N: usize, const D: usize, F>(
    start: u64,
    stop: u64,
    threads: usize,
    qubits: [usize; N],
    func: F,
) where
    F: Fn(&[u64; D]) + Send + Sync,
{
    let mut qubits_sorted = qubits;
    qubits_sorted.sort_unstable();
    let end = stop >> N;
    let visit = |k: u64| func(&indexes_fixed::<N, D>(&qubits, &qubits_sorted, k));
    dispatch(
        threads,
        || (start..end).into_par_iter().for_each(&visit),
        || (start..end).for_each(&visit),
    )
}

/// Apply `func(block, params)` to every `gap`-th reduced index starting at `start`
///
/// Used by kernels that pair blocks along a computed stride instead of
/// visiting every reduced index. A `gap` of 0 is treated as 1.
pub fn apply_lambda_gap<P, F>(
    start: u64,
    stop: u64,
    gap: u64,
    threads: usize,
    qubits: &[usize],
    params: &P,
    func: F,
) where
    P: Sync + ?Sized,
    F: Fn(&[u64], &P) + Send + Sync,
{
    let gap = gap.max(1);
    let qubits_sorted = sorted(qubits);
    let end = stop >> qubits.len();
    let count = if end > start { (end - start).div_ceil(gap) } else { 0 };
    let visit = |i: u64| {
        let k = start + i * gap;
        func(&indexes(qubits, &qubits_sorted, k), params)
    };
    dispatch(
        threads,
        || (0..count).into_par_iter().for_each(&visit),
        || (0..count).for_each(&visit),
    )
}

/// Sum `func(k, re, im)` contributions over every full index in `[start, stop)`
pub fn apply_reduction_lambda<F>(start: u64, stop: u64, threads: usize, func: F) -> Complex64
where
    F: Fn(u64, &mut f64, &mut f64) + Send + Sync,
{
    let step = |(mut re, mut im): (f64, f64), k: u64| {
        func(k, &mut re, &mut im);
        (re, im)
    };
    let (re, im) = dispatch(
        threads,
        || {
            (start..stop)
                .into_par_iter()
                .fold(|| (0.0, 0.0), step)
                .reduce(|| (0.0, 0.0), sum_pairs)
        },
        || (start..stop).fold((0.0, 0.0), step),
    );
    Complex64::new(re, im)
}

/// Sum `func(block, re, im)` contributions over every reduced index in
/// `[start, stop >> qubits.len())`
pub fn apply_reduction_lambda_qubits<F>(
    start: u64,
    stop: u64,
    threads: usize,
    qubits: &[usize],
    func: F,
) -> Complex64
where
    F: Fn(&[u64], &mut f64, &mut f64) + Send + Sync,
{
    let qubits_sorted = sorted(qubits);
    let end = stop >> qubits.len();
    let step = |(mut re, mut im): (f64, f64), k: u64| {
        func(&indexes(qubits, &qubits_sorted, k), &mut re, &mut im);
        (re, im)
    };
    let (re, im) = dispatch(
        threads,
        || {
            (start..end)
                .into_par_iter()
                .fold(|| (0.0, 0.0), step)
                .reduce(|| (0.0, 0.0), sum_pairs)
        },
        || (start..end).fold((0.0, 0.0), step),
    );
    Complex64::new(re, im)
}
