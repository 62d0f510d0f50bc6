// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Implementation of Shanks's square forms factorization
//!
//! References: http://homes.cerias.purdue.edu/~ssw/squfof.pdf
//!
//! The forward phase walks the cycle of reduced binary quadratic forms of
//! discriminant 4kn until a form with square leading coefficient shows up
//! on an odd step; the reverse phase walks the square-root form's cycle
//! backwards to its symmetry point, where the P coefficient exposes a
//! divisor through gcd(n, P).

use num_integer::Integer;

use crate::arith::isqrt;
use crate::{params, Preferences, Uint, Verbosity};

/// Multipliers in the order recommended by Shanks and Riesel: small
/// products of 3, 5, 7, 11 improve the odds that some form cycle of
/// discriminant 4kn contains an ambiguous form.
const MULTIPLIERS: [u64; 16] = [
    1, 3, 5, 7, 11, 15, 21, 33, 35, 55, 77, 105, 165, 231, 385, 1155,
];

pub fn squfof(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let n = *n;
    'kloop: for &k in &MULTIPLIERS {
        let kn = n * Uint::from(k);
        let sqrt_kn = isqrt(kn);
        if sqrt_kn * sqrt_kn == kn {
            // kn is a perfect square: its root already shares a factor
            // with n unless the square came entirely from k.
            let f = Integer::gcd(&n, &sqrt_kn);
            if f > Uint::ONE && f < n {
                return Some(f);
            }
            continue 'kloop;
        }

        let iters = std::cmp::min(
            3 * isqrt(sqrt_kn).digits()[0] + 100,
            params::SQUFOF_MAX_ITERS,
        );

        // Forward phase: iterate the form cycle until Q is a square
        // on an odd step.
        let mut p_prev = sqrt_kn;
        let mut q_prev = Uint::ONE;
        let mut q = kn - p_prev * p_prev;
        let mut q_sqrt = Uint::ZERO;
        for i in 1..=iters {
            if i == iters {
                continue 'kloop;
            }
            let b = (sqrt_kn + p_prev) / q;
            let p = b * q - p_prev;
            let qnext = if p_prev > p {
                q_prev + b * (p_prev - p)
            } else {
                q_prev - b * (p - p_prev)
            };
            if i % 2 == 1 && maybe_square(&qnext) {
                let r = isqrt(qnext);
                if r * r == qnext {
                    q_sqrt = r;
                    p_prev = p;
                    break;
                }
            }
            p_prev = p;
            q_prev = q;
            q = qnext;
        }

        // Reverse phase: restart from the square-root form and walk to
        // the symmetry point where P repeats.
        let b = (sqrt_kn - p_prev) / q_sqrt;
        let mut p_prev = b * q_sqrt + p_prev;
        let mut q_prev = q_sqrt;
        let mut q = (kn - p_prev * p_prev) / q_prev;
        for i in 1..=iters {
            if i == iters {
                continue 'kloop;
            }
            let b = (sqrt_kn + p_prev) / q;
            let p = b * q - p_prev;
            let qnext = if p_prev > p {
                q_prev + b * (p_prev - p)
            } else {
                q_prev - b * (p - p_prev)
            };
            if p == p_prev {
                break;
            }
            p_prev = p;
            q_prev = q;
            q = qnext;
        }
        let f = Integer::gcd(&n, &p_prev);
        if f > Uint::ONE && f < n {
            if prefs.verbosity >= Verbosity::Info {
                eprintln!("SQUFOF found factor {f} with multiplier {k}");
            }
            return Some(f);
        }
    }
    None
}

// A cheap square prefilter on the low bits: squares are 0 or 4 mod 8
// or odd 1 mod 8, and 0, 1 or 4 mod 5.
fn maybe_square(n: &Uint) -> bool {
    let low = n.digits()[0];
    (low & 6 == 0 || low & 7 == 4) && (*n % 5_u64 + 1) % 5 <= 2
}
