// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Miller-Rabin primality testing.
//!
//! Below 3.317e24 the fixed witness set {2..37} is a proven deterministic
//! test (Sorenson-Webster), which covers every 24-digit input. Larger
//! numbers fall back to random witnesses, 40 rounds by default.

use std::str::FromStr;

use rand::Rng;

use crate::arith_montgomery::ZmodN;
use crate::Uint;

const SMALL_PRIMES: [u64; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

// Largest bound for which WITNESSES is deterministic.
const DETERMINISTIC_LIMIT: &str = "3317044064679887385961981";

/// Miller-Rabin with the default round count.
pub fn is_probable_prime(n: &Uint) -> bool {
    miller_rabin(n, 40)
}

/// Miller-Rabin primality test. The witness set is deterministic below
/// 3.317e24; `rounds` random witnesses are used above.
pub fn miller_rabin(n: &Uint, rounds: usize) -> bool {
    if *n < Uint::from(2_u64) {
        return false;
    }
    for &p in &SMALL_PRIMES {
        if *n == Uint::from(p) {
            return true;
        }
        if (*n % p) == 0 {
            return false;
        }
    }
    // n is odd and larger than any tabulated prime.
    let zn = ZmodN::new(*n);
    let nm1 = n - Uint::ONE;
    let r = nm1.trailing_zeros();
    let d = nm1 >> r;
    let limit = Uint::from_str(DETERMINISTIC_LIMIT).unwrap();
    if *n < limit {
        WITNESSES
            .iter()
            .all(|&a| strong_probable_prime(&zn, Uint::from(a), &d, r))
    } else {
        let mut rng = rand::thread_rng();
        (0..rounds).all(|_| {
            let a = Uint::from(rng.gen_range(2_u64..u64::MAX));
            strong_probable_prime(&zn, a, &d, r)
        })
    }
}

// One strong pseudoprime round for witness a, where zn.n - 1 = d << r.
fn strong_probable_prime(zn: &ZmodN, a: Uint, d: &Uint, r: u32) -> bool {
    let a = a % zn.n;
    if a.is_zero() {
        return true;
    }
    let one = zn.one();
    let minus_one = zn.sub(&zn.zero(), &one);
    let mut x = zn.pow(&zn.from_int(a), d);
    if x == one || x == minus_one {
        return true;
    }
    for _ in 1..r {
        x = zn.mul(&x, &x);
        if x == minus_one {
            return true;
        }
    }
    false
}
