// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Generation of semiprime test inputs.
//!
//! Benchmarks and tests want reproducible inputs: the generator runs on a
//! seedable ChaCha stream so a fixed seed always yields the same product.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::primality::is_probable_prime;
use crate::Uint;

/// Generate a semiprime with the requested number of decimal digits,
/// as a product of two distinct primes of digits/2 digits each
/// (the first factor gets the smaller half for odd digit counts).
/// Returns (n, p, q).
pub fn generate_semiprime(digits: u32, seed: Option<u64>) -> (Uint, Uint, Uint) {
    assert!((2..=50).contains(&digits));
    let d1 = digits / 2;
    let d2 = digits - d1;
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let p = random_prime(&mut rng, d1);
    let mut q = random_prime(&mut rng, d2);
    while q == p {
        q = random_prime(&mut rng, d2);
    }
    (p * q, p, q)
}

fn pow10(d: u32) -> Uint {
    Uint::from(10_u64).pow(d)
}

/// A random prime in [10^(d-1), 10^d - 1].
fn random_prime<R: Rng>(rng: &mut R, d: u32) -> Uint {
    let lo = pow10(d - 1);
    let span = pow10(d) - lo;
    loop {
        let c = (lo + random_below(rng, span)) | Uint::ONE;
        if is_probable_prime(&c) {
            return c;
        }
    }
}

// Uniform sample below bound through masked rejection.
fn random_below<R: Rng>(rng: &mut R, bound: Uint) -> Uint {
    let bits = bound.bits();
    debug_assert!(bits > 0);
    let words = ((bits + 63) / 64) as usize;
    let extra = 64 * words as u32 - bits;
    loop {
        let mut digits = [0_u64; Uint::BITS as usize / 64];
        for d in digits.iter_mut().take(words) {
            *d = rng.gen();
        }
        if extra > 0 {
            digits[words - 1] &= u64::MAX >> extra;
        }
        let x = Uint::from_digits(digits);
        if x < bound {
            return x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_semiprime() {
        for digits in [6_u32, 11, 20] {
            let (n, p, q) = generate_semiprime(digits, Some(42));
            assert_eq!(n, p * q);
            assert!(p != q);
            assert!(is_probable_prime(&p) && is_probable_prime(&q));
            let d1 = digits / 2;
            let d2 = digits - d1;
            assert!(pow10(d1 - 1) <= p && p < pow10(d1));
            assert!(pow10(d2 - 1) <= q && q < pow10(d2));
            // n itself has digits or digits-1 decimal digits.
            assert!(n >= pow10(d1 + d2 - 2));
            assert!(n < pow10(d1 + d2));
        }
    }

    #[test]
    fn test_generate_seeded() {
        // Identical seeds give identical outputs, distinct seeds differ.
        let a = generate_semiprime(18, Some(4711));
        let b = generate_semiprime(18, Some(4711));
        assert_eq!(a, b);
        let c = generate_semiprime(18, Some(4712));
        assert!(a.0 != c.0);
    }
}
