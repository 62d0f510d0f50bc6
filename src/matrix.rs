// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Kernels of exponent-parity matrices modulo 2.
//!
//! CFRAC encodes each smooth relation as a bit vector over the factor
//! base (one parity bit per prime, plus the sign bit). A subset of
//! relations whose parity vectors XOR to zero is a congruence of
//! squares. Matrices here are small (the factor base of a 45-digit
//! number has a few thousand primes) so a dense elimination is enough.
//!
//! Columns are processed in input order: each one is folded against the
//! already-placed pivots until it either claims a still-free row or
//! cancels completely. A parallel history matrix tracks which input
//! columns were XORed together, so a cancelled column hands back its
//! history row as a ready-made kernel vector. Processing in input order
//! also makes the tie-break deterministic: the kernel only ever names
//! the earliest relations able to produce a given dependency.

// bitvec_simd rather than plain bitvec: the XOR-heavy access pattern
// here optimizes much better through its wide lanes.

use bitvec_simd::BitVec;

/// Given the m parity columns of a relation set (n bits each), return
/// bit vectors of length m spanning the kernel: each names a subset of
/// columns with vanishing XOR.
pub fn kernel_gauss(columns: Vec<BitVec>) -> Vec<BitVec> {
    let nrows = columns[0].len();
    let ncols = columns.len();
    assert!(columns.iter().all(|c| c.len() == nrows));
    let mut cols = columns;
    // Invariant: cols[j] equals the XOR of the input columns named by
    // history[j].
    let mut history: Vec<BitVec> = (0..ncols)
        .map(|j| {
            let mut h = BitVec::zeros(ncols);
            h.set(j, true);
            h
        })
        .collect();
    // owner[r] = the pivot column whose topmost set bit is row r.
    let mut owner: Vec<Option<usize>> = vec![None; nrows];
    let mut kernel = vec![];
    for j in 0..ncols {
        // Each fold clears the topmost set bit and a pivot has nothing
        // above its own row, so the loop walks strictly downwards.
        loop {
            let top = cols[j].leading_zeros();
            if top >= nrows {
                kernel.push(history[j].clone());
                break;
            }
            let Some(i) = owner[top] else {
                owner[top] = Some(j);
                break;
            };
            // Pivots always come from earlier columns.
            debug_assert!(i < j);
            let (head, tail) = cols.split_at_mut(j);
            tail[0].xor_inplace(&head[i]);
            let (head, tail) = history.split_at_mut(j);
            tail[0].xor_inplace(&head[i]);
        }
    }
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_columns(rows: usize, vecs: &[&[usize]]) -> Vec<BitVec> {
        vecs.iter()
            .map(|idxs| {
                let mut v = BitVec::zeros(rows);
                for &i in idxs.iter() {
                    v.set(i, true);
                }
                v
            })
            .collect()
    }

    #[test]
    fn test_kernel_simple() {
        // col2 = col0 XOR col1, so (1,1,1) spans the kernel.
        let cols = make_columns(4, &[&[0, 1], &[1, 2], &[0, 2]]);
        let ker = kernel_gauss(cols);
        assert_eq!(ker.len(), 1);
        assert_eq!(ker[0].clone().into_usizes(), vec![0, 1, 2]);
    }

    #[test]
    fn test_kernel_trivial() {
        // Independent columns: empty kernel.
        let cols = make_columns(3, &[&[0], &[1], &[2]]);
        assert!(kernel_gauss(cols).is_empty());
    }

    #[test]
    fn test_kernel_zero_column() {
        // An all-zero input column is its own kernel vector.
        let cols = make_columns(3, &[&[0, 2], &[], &[0, 2]]);
        let ker = kernel_gauss(cols);
        assert_eq!(ker.len(), 2);
        assert_eq!(ker[0].clone().into_usizes(), vec![1]);
        assert_eq!(ker[1].clone().into_usizes(), vec![0, 2]);
    }

    #[test]
    fn test_kernel_random() {
        // Pseudo-random 60x75 matrix: every kernel vector must XOR its
        // selected original columns to zero, and the kernel has at least
        // ncols - nrows elements.
        let rows = 60;
        let ncols = 75;
        let mut state = 0xdeadbeef_12345678_u64;
        let mut orig: Vec<Vec<usize>> = vec![];
        for _ in 0..ncols {
            let mut idxs = vec![];
            for r in 0..rows {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                if state >> 62 == 0 {
                    idxs.push(r);
                }
            }
            orig.push(idxs);
        }
        let cols = make_columns(rows, &orig.iter().map(|v| &v[..]).collect::<Vec<_>>());
        let ker = kernel_gauss(cols);
        assert!(ker.len() >= ncols - rows, "kernel dimension {}", ker.len());
        for v in ker {
            let mut acc = vec![false; rows];
            for i in v.into_usizes() {
                for &r in &orig[i] {
                    acc[r] = !acc[r];
                }
            }
            assert!(acc.iter().all(|&b| !b));
        }
    }
}
