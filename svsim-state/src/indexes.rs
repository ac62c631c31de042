//! Bit-index engine
//!
//! Maps a qubit subset and a reduced index `k` (the state of the spectator
//! qubits) to the full amplitude indices a gate touches.
//!
//! For `M` total qubits and an `N`-qubit list, `k` ranges over `[0, 2^(M-N))`.
//! [`index0`] inserts a zero bit at every listed qubit position; [`indexes`]
//! then enumerates all `2^N` settings of those bits.
//!
//! # Example
//! ```
//! use svsim_state::indexes::{index0, indexes};
//!
//! // k = 77 = 0b1001101, zeros inserted at positions 1 and 4
//! assert_eq!(index0(&[1, 4], 77), 297);
//! assert_eq!(indexes(&[1, 4], &[1, 4], 77).as_slice(), &[297, 299, 313, 315]);
//! ```

use smallvec::SmallVec;

/// `BITS[i] = 2^i`
pub const BITS: [u64; 64] = bit_table();

/// `MASKS[i] = 2^i - 1`
pub const MASKS: [u64; 64] = mask_table();

const fn bit_table() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut i = 0;
    while i < 64 {
        table[i] = 1u64 << i;
        i += 1;
    }
    table
}

const fn mask_table() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut i = 0;
    while i < 64 {
        table[i] = (1u64 << i) - 1;
        i += 1;
    }
    table
}

/// Index block for one reduced index; stays inline up to 5 qubits
pub type IndexBlock = SmallVec<[u64; 32]>;

/// Qubit list storage used throughout the state layer
pub type QubitList = SmallVec<[usize; 8]>;

/// Ascending copy of a qubit list
pub fn sorted(qubits: &[usize]) -> QubitList {
    let mut out = QubitList::from_slice(qubits);
    out.sort_unstable();
    out
}

/// Insert a zero bit into `k` at every position of `qubits_sorted`
///
/// Positions must be ascending: each insertion is computed against the
/// already-shifted value.
#[inline]
pub fn index0(qubits_sorted: &[usize], k: u64) -> u64 {
    let mut ret = k;
    for &q in qubits_sorted {
        let low = ret & MASKS[q];
        ret >>= q;
        ret = ret.checked_shl((q + 1) as u32).unwrap_or(0);
        ret |= low;
    }
    ret
}

/// Fill `block[1..]` from `block[0]` by doubling over `qubits`
///
/// Slot `j` receives the index whose bit `i` of `j` is mapped onto `qubits[i]`.
#[inline]
fn expand(qubits: &[usize], block: &mut [u64]) {
    for (i, &q) in qubits.iter().enumerate() {
        let n = BITS[i] as usize;
        let bit = BITS[q];
        for j in 0..n {
            block[n + j] = block[j] | bit;
        }
    }
}

/// All `2^N` full indices for reduced index `k`
///
/// `qubits` decides the block layout, `qubits_sorted` must hold the same
/// positions in ascending order. For `qubits = [3, 1]` the block is ordered
/// `[0b0?0?, 0b1?0?, 0b0?1?, 0b1?1?]`, i.e. bit 0 of the slot is qubit 3.
pub fn indexes(qubits: &[usize], qubits_sorted: &[usize], k: u64) -> IndexBlock {
    let mut block: IndexBlock = SmallVec::from_elem(0, 1usize << qubits.len());
    block[0] = index0(qubits_sorted, k);
    expand(qubits, &mut block);
    block
}

/// Fixed-size variant of [`indexes`] for a compile-time qubit count
///
/// `D` must equal `2^N`.
pub fn indexes_fixed<const N: usize, const D: usize>(
    qubits: &[usize; N],
    qubits_sorted: &[usize; N],
    k: u64,
) -> [u64; D] {
    debug_assert_eq!(D, 1usize << N, "index block size must be 2^N");
    let mut block = [0u64; D];
    block[0] = index0(qubits_sorted, k);
    expand(qubits, &mut block);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        for i in 0..63 {
            assert_eq!(BITS[i] * 2, BITS[i + 1]);
        }
        for i in 0..64 {
            assert_eq!(MASKS[i], BITS[i] - 1);
        }
        assert_eq!(BITS[63], 1u64 << 63);
    }

    #[test]
    fn test_index0_example() {
        assert_eq!(index0(&[1, 4], 77), 297);
        assert_eq!(index0(&[], 77), 77);
        assert_eq!(index0(&[0], 1), 2);
    }

    #[test]
    fn test_indexes_example() {
        let block = indexes(&[1, 4], &[1, 4], 77);
        assert_eq!(block.as_slice(), &[297, 299, 313, 315]);
    }

    #[test]
    fn test_indexes_follow_unsorted_order() {
        let block = indexes(&[4, 1], &[1, 4], 77);
        assert_eq!(block.as_slice(), &[297, 313, 299, 315]);
    }

    #[test]
    fn test_fixed_matches_dynamic() {
        let qubits = [5, 0, 2];
        let sorted_q = [0, 2, 5];
        for k in 0..16 {
            let fixed: [u64; 8] = indexes_fixed(&qubits, &sorted_q, k);
            let dynamic = indexes(&qubits, &sorted_q, k);
            assert_eq!(&fixed[..], dynamic.as_slice());
        }
    }

    #[test]
    fn test_highest_qubit() {
        assert_eq!(index0(&[63], 5), 5);
        let block = indexes(&[63], &[63], 5);
        assert_eq!(block.as_slice(), &[5, 5 | (1u64 << 63)]);
    }

    #[test]
    fn test_sorted() {
        assert_eq!(sorted(&[3, 0, 2]).as_slice(), &[0, 2, 3]);
    }

    #[test]
    fn test_large_block_spills_to_heap() {
        let qubits: Vec<usize> = (0..7).collect();
        let block = indexes(&qubits, &qubits, 1);
        assert_eq!(block.len(), 128);
        assert_eq!(block[0], 128);
        assert_eq!(block[127], 255);
    }
}
