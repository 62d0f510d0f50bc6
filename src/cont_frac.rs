// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Continued fraction expansion of √n.
//!
//! The expansion is driven by the classical recurrence over the triple
//! (m, d, a):
//!   m' = d a - m,   d' = (n - m'^2) / d,   a' = (a0 + m') / d'
//! starting from m=0, d=1, a0=⌊√n⌋. Alongside it, the convergent
//! numerators and denominators follow p_k = a_k p_{k-1} + p_{k-2}
//! (same for q) and are kept reduced modulo n: every consumer of the
//! sequence works modulo n, and the residues p_k^2 - n q_k^2 do not
//! depend on the reduction.
//!
//! The sequence is empty when n is a perfect square, infinite otherwise.

use crate::arith::isqrt;
use crate::Uint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Convergent {
    /// Index in the expansion (0 for the integer part).
    pub k: u64,
    /// Partial quotient a_k.
    pub a: Uint,
    /// Convergent numerator p_k mod n.
    pub p: Uint,
    /// Convergent denominator q_k mod n.
    pub q: Uint,
}

/// Lazy iterator over the partial quotients and convergents of √n.
/// The state is plain data: clones advance independently.
#[derive(Clone, Debug)]
pub struct SqrtContFrac {
    n: Uint,
    a0: Uint,
    m: Uint,
    d: Uint,
    a: Uint,
    p_prev: Uint,
    p: Uint,
    q_prev: Uint,
    q: Uint,
    k: u64,
    square: bool,
}

impl SqrtContFrac {
    pub fn new(n: Uint) -> Self {
        let a0 = isqrt(n);
        SqrtContFrac {
            n,
            a0,
            m: Uint::ZERO,
            d: Uint::ONE,
            a: a0,
            p_prev: Uint::ONE,
            p: Uint::ZERO,
            q_prev: Uint::ZERO,
            q: Uint::ONE,
            k: 0,
            square: a0 * a0 == n,
        }
    }

    /// Only the partial quotient stream.
    pub fn partial_quotients(self) -> impl Iterator<Item = Uint> {
        self.map(|c| c.a)
    }
}

impl Iterator for SqrtContFrac {
    type Item = Convergent;

    fn next(&mut self) -> Option<Convergent> {
        if self.square {
            return None;
        }
        if self.k == 0 {
            self.p = self.a0 % self.n;
        } else {
            let m = self.d * self.a - self.m;
            let d = (self.n - m * m) / self.d;
            let a = (self.a0 + m) / d;
            debug_assert!((self.n - m * m) % self.d == Uint::ZERO);
            let p = (a * self.p + self.p_prev) % self.n;
            let q = (a * self.q + self.q_prev) % self.n;
            (self.m, self.d, self.a) = (m, d, a);
            (self.p_prev, self.p) = (self.p, p);
            (self.q_prev, self.q) = (self.q, q);
        }
        let c = Convergent {
            k: self.k,
            a: self.a,
            p: self.p,
            q: self.q,
        };
        self.k += 1;
        Some(c)
    }
}
