// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Implementation of the Pollard P-1 family.
//!
//! All variants iterate a power map over the multiplicative group mod n
//! and test gcd(a - 1, n) at intervals: when the order of a mod p divides
//! the accumulated exponent for one prime factor p only, the gcd exposes
//! p. They fail silently on inputs whose group orders are not smooth.
//!
//! - the standard variant raises a to b = 2, 3, 4, ... so the exponent
//!   accumulates b!;
//! - the self-referential variant iterates a^a;
//! - the power-mod variant interleaves one square-and-multiply step per
//!   outer iteration, reloading the exponent from the current product
//!   when the bit stream runs out;
//! - the reference variant walks prime powers p^e <= B for a smoothness
//!   bound B = exp(sqrt(ln n ln ln n)/sqrt 2) and is the only one with
//!   rigorous coverage of B-smooth group orders.
//!
//! Reference:
//! J.M. Pollard, Theorems on factorization and primality testing, 1974

use num_integer::Integer;

use crate::arith_montgomery::{MInt, ZmodN};
use crate::fbase::PrimeSieve;
use crate::{params, Preferences, Uint, Verbosity};

/// Standard P-1: a <- a^b for b = 2, 3, 4, ...
///
/// The walk keeps the states of the current gcd interval: when a test
/// collapses to gcd = n, both group orders were exhausted inside the
/// interval and the split point is recovered by rescanning step by step.
pub fn pm1_standard(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let zn = ZmodN::new(*n);
    let max_b: u64 = match n.bits() {
        0..=64 => 10_000,
        65..=128 => 40_000,
        _ => 100_000,
    };
    let mut a = zn.from_int(Uint::from(prefs.pm1_base) % zn.n);
    let mut window: Vec<MInt> = Vec::with_capacity(prefs.gcd_interval);
    for b in 2..=max_b {
        a = zn.pow(&a, &Uint::from(b));
        window.push(a);
        if b % prefs.gcd_interval as u64 == 0 {
            match gcd_check(n, &zn, &a, prefs, "P-1") {
                Outcome::Factor(f) => return Some(f),
                Outcome::Collapsed => {
                    for w in &window {
                        if let Outcome::Factor(f) = gcd_check(n, &zn, w, prefs, "P-1") {
                            return Some(f);
                        }
                    }
                    return None;
                }
                Outcome::Nothing => {}
            }
            window.clear();
        }
    }
    None
}

/// Self-referential P-1: a <- a^a.
pub fn pm1_selfref(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let zn = ZmodN::new(*n);
    let iters: u64 = match n.bits() {
        0..=64 => 4_000,
        65..=128 => 2_000,
        _ => 1_000,
    };
    let mut a = zn.from_int(Uint::from(prefs.pm1_base) % zn.n);
    for i in 1..=iters {
        let e = zn.to_int(a);
        a = zn.pow(&a, &e);
        if i % prefs.gcd_interval as u64 == 0 {
            match gcd_check(n, &zn, &a, prefs, "P-1 (self-referential)") {
                Outcome::Factor(f) => return Some(f),
                Outcome::Collapsed => return None,
                Outcome::Nothing => {}
            }
        }
    }
    None
}

/// Interleaved P-1: the square-and-multiply state (b, e, r) advances one
/// bit per outer iteration. When e runs out of bits, it is reloaded from
/// the current product r and r resets to one; the base keeps squaring.
pub fn pm1_powmod(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let zn = ZmodN::new(*n);
    let iters: u64 = match n.bits() {
        0..=64 => 200_000,
        65..=128 => 400_000,
        _ => 800_000,
    };
    let mut b = zn.from_int(Uint::from(prefs.pm1_base) % zn.n);
    let mut e = *n;
    let mut r = zn.one();
    for i in 1..=iters {
        if e.digits()[0] & 1 == 1 {
            r = zn.mul(&r, &b);
        }
        b = zn.mul(&b, &b);
        e = e >> 1;
        if e == Uint::ZERO {
            e = zn.to_int(r);
            r = zn.one();
            if e == Uint::ZERO {
                // r was in the zero class: the walk is stuck.
                return None;
            }
        }
        if i % (prefs.gcd_interval as u64 * 16) == 0 {
            match gcd_check(n, &zn, &b, prefs, "P-1 (power-mod)") {
                Outcome::Factor(f) => return Some(f),
                Outcome::Collapsed => return None,
                Outcome::Nothing => {}
            }
            match gcd_check(n, &zn, &r, prefs, "P-1 (power-mod)") {
                Outcome::Factor(f) => return Some(f),
                Outcome::Collapsed => return None,
                Outcome::Nothing => {}
            }
        }
    }
    None
}

/// Reference P-1: a <- a^(p^e) for primes p <= B with p^e <= B.
///
/// Prime powers are accumulated into multi-word exponent blocks of
/// `gcd_interval` primes so that exponentiation uses the wide window
/// ladder, with one gcd test per block.
pub fn pm1_smooth(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let b1 = prefs.pm1_bound.unwrap_or_else(|| params::pm1_bound(n));
    if prefs.verbosity >= Verbosity::Info {
        eprintln!("Attempting P-1 with B1={b1}");
    }
    let zn = ZmodN::new(*n);
    let mut a = zn.from_int(Uint::from(prefs.pm1_base) % zn.n);
    let mut sieve = PrimeSieve::new();
    let mut block_pows: Vec<u64> = Vec::with_capacity(prefs.gcd_interval);
    let mut block_exp = Uint::ONE;
    let mut done = false;
    while !done {
        let block = sieve.next();
        if block.is_empty() {
            break;
        }
        for &p in block {
            let p = p as u64;
            if p > b1 {
                done = true;
                break;
            }
            let mut pow = p;
            while pow <= b1 / p {
                pow *= p;
            }
            block_pows.push(pow);
            block_exp *= Uint::from(pow);
            if block_pows.len() >= prefs.gcd_interval || block_exp.bits() > Uint::BITS - 64 {
                match pm1_block(n, &zn, &mut a, &block_pows, &block_exp, prefs) {
                    Outcome::Factor(f) => return Some(f),
                    Outcome::Collapsed => return None,
                    Outcome::Nothing => {}
                }
                block_pows.clear();
                block_exp = Uint::ONE;
            }
        }
    }
    // Flush the partial block.
    if !block_pows.is_empty() {
        if let Outcome::Factor(f) = pm1_block(n, &zn, &mut a, &block_pows, &block_exp, prefs) {
            return Some(f);
        }
    }
    None
}

// Apply one exponent block and test the gcd; on a collapse replay the
// block one prime power at a time to isolate the split point.
fn pm1_block(
    n: &Uint,
    zn: &ZmodN,
    a: &mut MInt,
    block_pows: &[u64],
    block_exp: &Uint,
    prefs: &Preferences,
) -> Outcome {
    let a_prev = *a;
    *a = zn.pow(a, block_exp);
    match gcd_check(n, zn, a, prefs, "P-1") {
        Outcome::Collapsed => {
            let mut w = a_prev;
            for &pow in block_pows {
                w = zn.pow(&w, &Uint::from(pow));
                match gcd_check(n, zn, &w, prefs, "P-1") {
                    Outcome::Factor(f) => return Outcome::Factor(f),
                    Outcome::Collapsed => return Outcome::Collapsed,
                    Outcome::Nothing => {}
                }
            }
            Outcome::Collapsed
        }
        out => out,
    }
}

enum Outcome {
    Factor(Uint),
    // gcd(a-1, n) = n: every factor collapsed at once.
    Collapsed,
    Nothing,
}

fn gcd_check(n: &Uint, zn: &ZmodN, a: &MInt, prefs: &Preferences, what: &str) -> Outcome {
    let d = zn.sub(a, &zn.one());
    let g = Integer::gcd(n, &d.0);
    if g > Uint::ONE && g < *n {
        if prefs.verbosity >= Verbosity::Info {
            eprintln!("{what} found factor {g}");
        }
        Outcome::Factor(g)
    } else if g == *n {
        Outcome::Collapsed
    } else {
        Outcome::Nothing
    }
}
