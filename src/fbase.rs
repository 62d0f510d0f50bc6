// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Prime sieves and the CFRAC factor base.
//!
//! The factor base holds -1 (the sign column), 2, and ascending odd primes
//! p such that n is a quadratic residue modulo p: only those can divide a
//! continued-fraction residue p_k^2 - n q_k^2.

use std::cmp::max;

use num_traits::One;
use rayon::prelude::*;

use crate::arith::{self, legendre};
use crate::{Int, Uint, UnexpectedFactor};

/// The CFRAC factor base for an input number n, with precomputed Barrett
/// dividers for trial division. `primes[0]` is the -1 marker.
#[derive(Clone, Debug)]
pub struct FBase {
    primes: Vec<i64>,
    // Dividers for primes[1..] (the -1 marker has none).
    divs: Vec<arith::Dividers>,
}

impl FBase {
    /// Build a factor base of the requested size. Candidates are filtered
    /// by the Legendre criterion, in parallel when allowed; the resulting
    /// base is ascending regardless.
    ///
    /// A candidate dividing n short-circuits the construction: it is a
    /// factor the screening has missed.
    pub fn new(n: &Uint, size: u32, parallel: bool) -> Result<FBase, UnexpectedFactor> {
        let size = max(size, 3) as usize;
        // About half of all odd primes pass the filter.
        let mut pool = 3 * size as u32;
        loop {
            let mut primes: Vec<i64> = vec![-1, 2];
            let mut divs = vec![arith::Dividers::new(2)];
            let cands = primes_from(3, pool);
            let eval = |&p: &u32| -> Result<Option<(u32, arith::Dividers)>, UnexpectedFactor> {
                let div = arith::Dividers::new(p);
                let np = div.mod_uint(n);
                if np == 0 {
                    return Err(UnexpectedFactor(p as u64));
                }
                if legendre(np, p as u64) == 1 {
                    Ok(Some((p, div)))
                } else {
                    Ok(None)
                }
            };
            let kept: Vec<Option<(u32, arith::Dividers)>> = if parallel {
                cands.par_iter().map(eval).collect::<Result<_, _>>()?
            } else {
                cands.iter().map(eval).collect::<Result<_, _>>()?
            };
            for (p, div) in kept.into_iter().flatten() {
                if primes.len() == size {
                    break;
                }
                primes.push(p as i64);
                divs.push(div);
            }
            if primes.len() == size {
                return Ok(FBase { primes, divs });
            }
            pool *= 2;
        }
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn p(&self, idx: usize) -> i64 {
        self.primes[idx]
    }

    pub fn primes(&self) -> &[i64] {
        &self.primes
    }

    pub fn bound(&self) -> u64 {
        *self.primes.last().unwrap() as u64
    }

    /// Index of a base element, -1 and 2 included.
    pub fn index_of(&self, p: i64) -> Option<usize> {
        if p == -1 {
            return Some(0);
        }
        self.primes[1..]
            .binary_search(&p)
            .ok()
            .map(|idx| idx + 1)
    }

    /// Trial division of x over the base. Returns the factor list (with a
    /// (-1, 1) head entry for negative x) if x factors completely, None
    /// otherwise.
    pub fn smooth_factors(&self, x: &Int) -> Option<Vec<(i64, u64)>> {
        let mut factors: Vec<(i64, u64)> = Vec::with_capacity(20);
        if x.is_negative() {
            factors.push((-1, 1));
        }
        let mut cofactor = x.abs().to_bits();
        for (i, div) in self.divs.iter().enumerate() {
            if cofactor.is_one() {
                break;
            }
            let mut exp = 0;
            loop {
                let (q, r) = div.divmod_uint(&cofactor);
                if r == 0 {
                    cofactor = q;
                    exp += 1;
                } else {
                    break;
                }
            }
            if exp > 0 {
                factors.push((self.primes[i + 1], exp));
            }
        }
        if cofactor.is_one() {
            Some(factors)
        } else {
            None
        }
    }
}

/// The first `count` primes, by a plain sieve of Eratosthenes.
pub fn primes(count: u32) -> Vec<u32> {
    // Rosser: the k-th prime lies below k(ln k + ln ln k) for k >= 6.
    let limit = if count < 6 {
        16
    } else {
        let k = count as f64;
        (k * (k.ln() + k.ln().ln())).ceil() as usize
    };
    let mut composite = vec![false; limit + 1];
    let mut out = Vec::with_capacity(count as usize);
    let mut i = 2_usize;
    while i <= limit && out.len() < count as usize {
        if !composite[i] {
            out.push(i as u32);
            let mut j = i * i;
            while j <= limit {
                composite[j] = true;
                j += i;
            }
        }
        i += 1;
    }
    debug_assert!(out.len() == count as usize);
    out
}

// Odd primes starting at `from`, at least `count` of them.
fn primes_from(from: u32, count: u32) -> Vec<u32> {
    let mut ps = primes(count + 2);
    ps.retain(|&p| p >= from);
    ps
}

/// Streams the primes below 2^32 in blocks: first the sieved base
/// (the primes under 2^16), then segments of 2^15 integers marked
/// against that base. The smooth-bound P-1/P+1 stage 1 consumes this;
/// its bounds can reach far beyond a comfortable flat sieve.
pub struct PrimeSieve {
    base: Vec<u32>,
    segment_start: u64,
    marks: Vec<bool>,
    out: Vec<u32>,
    started: bool,
}

const SEGMENT: u64 = 1 << 15;

impl PrimeSieve {
    pub fn new() -> Self {
        // There are 6542 primes below 2^16, enough to mark any segment
        // under 2^32.
        PrimeSieve {
            base: primes(6542),
            segment_start: 1 << 16,
            marks: vec![false; SEGMENT as usize],
            out: vec![],
            started: false,
        }
    }

    /// The next block of consecutive primes; empty once past 2^32.
    pub fn next(&mut self) -> &[u32] {
        if !self.started {
            self.started = true;
            return &self.base;
        }
        if self.segment_start >= 1 << 32 {
            self.out.clear();
            return &self.out;
        }
        let lo = self.segment_start;
        let hi = lo + SEGMENT;
        self.marks.fill(false);
        for &p in &self.base {
            let p = p as u64;
            // Lowest multiple of p inside the segment.
            let mut m = (lo + p - 1) / p * p;
            while m < hi {
                self.marks[(m - lo) as usize] = true;
                m += p;
            }
        }
        self.out.clear();
        for (i, &marked) in self.marks.iter().enumerate() {
            if !marked {
                self.out.push((lo + i as u64) as u32);
            }
        }
        self.segment_start = hi;
        &self.out
    }
}

impl Default for PrimeSieve {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::sqrt_mod;

    #[test]
    fn test_primes() {
        assert_eq!(primes(10), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        // The 100th prime is 541; 1229 primes fit below 10^4.
        assert_eq!(primes(100).last(), Some(&541));
        let ps = primes(1229);
        assert_eq!(ps.len(), 1229);
        assert_eq!(ps.last(), Some(&9973));
    }

    #[test]
    fn test_primesieve() {
        let mut s = PrimeSieve::new();
        let base: Vec<u32> = s.next().to_vec();
        assert_eq!(base.first(), Some(&2));
        assert_eq!(base.last(), Some(&65521));
        // The stream resumes seamlessly above the base: 2^16 + 1 is a
        // (Fermat) prime.
        assert_eq!(s.next().first(), Some(&65537));

        // pi(10^6) = 78498, counted across blocks.
        let mut s = PrimeSieve::new();
        let mut count = 0_usize;
        loop {
            let block = s.next();
            if block.is_empty() || block[0] >= 1_000_000 {
                break;
            }
            count += block.iter().take_while(|&&p| p < 1_000_000).count();
        }
        assert_eq!(count, 78498);
    }

    #[test]
    fn test_fbase() {
        let n = Uint::from(1009_u64 * 2017);
        let fb = FBase::new(&n, 60, false).unwrap();
        assert_eq!(fb.len(), 60);
        assert_eq!(fb.p(0), -1);
        assert_eq!(fb.p(1), 2);
        // Ascending, and every odd element admits a square root of n.
        for idx in 2..fb.len() {
            let p = fb.p(idx);
            assert!(p > fb.p(idx - 1));
            assert!(sqrt_mod(n % (p as u64), p as u64).is_some());
        }
        // Parallel construction yields the same base.
        let fb2 = FBase::new(&n, 60, true).unwrap();
        assert_eq!(fb.primes(), fb2.primes());
    }

    #[test]
    fn test_fbase_unexpected_factor() {
        // 10007 divides n and is small enough to be a base candidate.
        let n = Uint::from(10007_u64) * Uint::from(1000003_u64);
        let res = FBase::new(&n, 2000, false);
        assert_eq!(res.unwrap_err(), UnexpectedFactor(10007));
    }

    #[test]
    fn test_smooth_factors() {
        let n = Uint::from(10403_u64); // 101 * 103
        let fb = FBase::new(&n, 40, false).unwrap();
        let (p1, p2, p3) = (fb.p(1), fb.p(2), fb.p(3));
        let x = Int::from(-(p1 * p1 * p1 * p2 * p3 * p3));
        let factors = fb.smooth_factors(&x).unwrap();
        assert_eq!(factors[0], (-1, 1));
        assert!(factors.contains(&(p1, 3)));
        assert!(factors.contains(&(p2, 1)));
        assert!(factors.contains(&(p3, 2)));
        // A factor outside the base leaves a cofactor behind.
        assert!(fb.smooth_factors(&Int::from(7919_i64 * 7927)).is_none());
    }
}
