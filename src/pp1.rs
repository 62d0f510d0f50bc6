// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Implementation of Williams P+1 algorithm
//!
//! The P+1 algorithm is an algebraic group factoring method using
//! conics (quadratic twist of the multiplicative group, which has
//! order p+1 over GF(p)).
//!
//! The standard conic xy=1 maps to v^2 = u^2 - 4 through
//! (u,v)=(x+y,x-y) and computing using only the u-coordinate
//! will use the quadratic twist iff u^2-4 is not a square modulo p.
//!
//! The conic supports:
//! - doubling of u(2P) = u(P)^2 - 2
//! - differential addition u(P+Q) + u(P-Q) = u(P) u(Q)
//!
//! Scalar multiplication corresponds to Lucas sequences V_k(P,1)
//! evaluated through a binary Montgomery ladder, and the identity
//! element has u = 2, so divisors show up in gcd(V - 2, n).
//!
//! Whether a given seed P lands on the twist depends on the (unknown)
//! factor, so the usual recommendation of GMP-ECM and the literature
//! is to try 3 seeds.

use num_integer::Integer;

use crate::arith_montgomery::{MInt, ZmodN};
use crate::fbase::PrimeSieve;
use crate::{params, Preferences, Uint, Verbosity};

const SEEDS: [u64; 3] = [3, 5, 9];

/// Run the P+1 algorithm with the default seeds and a smoothness bound
/// derived from the input size.
pub fn pp1(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let b1 = prefs.pm1_bound.unwrap_or_else(|| params::pm1_bound(n));
    let zn = ZmodN::new(*n);
    for seed in SEEDS {
        if let Some(f) = pp1_stage1(n, &zn, seed, b1, prefs) {
            return Some(f);
        }
    }
    None
}

fn pp1_stage1(n: &Uint, zn: &ZmodN, seed: u64, b1: u64, prefs: &Preferences) -> Option<Uint> {
    if prefs.verbosity >= Verbosity::Info {
        eprintln!("Attempting P+1 with seed={seed} B1={b1}");
    }
    let two = zn.two();
    let mut g = zn.from_int(Uint::from(seed) % zn.n);
    let mut sieve = PrimeSieve::new();
    let mut since_gcd = 0_usize;
    let mut window: Vec<MInt> = Vec::with_capacity(prefs.gcd_interval);
    loop {
        let block = sieve.next();
        if block.is_empty() {
            return None;
        }
        for &p in block {
            let p = p as u64;
            if p > b1 {
                // Last partial window.
                return match vgcd(n, zn, &g, &two) {
                    Vgcd::Factor(f) => Some(f),
                    Vgcd::Collapsed => backtrack(n, zn, &window, &two),
                    Vgcd::Nothing => None,
                };
            }
            // With binary chains, combining primes into larger exponents
            // does not save multiplications.
            let mut pow = p;
            while pow <= b1 / p {
                pow *= p;
            }
            g = lucas_v(zn, &g, pow);
            window.push(g);
            since_gcd += 1;
            if since_gcd >= prefs.gcd_interval {
                since_gcd = 0;
                match vgcd(n, zn, &g, &two) {
                    Vgcd::Factor(f) => {
                        if prefs.verbosity >= Verbosity::Info {
                            eprintln!("P+1 found factor {f} (seed={seed})");
                        }
                        return Some(f);
                    }
                    Vgcd::Collapsed => return backtrack(n, zn, &window, &two),
                    Vgcd::Nothing => {}
                }
                window.clear();
            }
        }
    }
}

enum Vgcd {
    Factor(Uint),
    Collapsed,
    Nothing,
}

fn vgcd(n: &Uint, zn: &ZmodN, g: &MInt, two: &MInt) -> Vgcd {
    let d = zn.sub(g, two);
    let f = Integer::gcd(n, &d.0);
    if f > Uint::ONE && f < *n {
        Vgcd::Factor(f)
    } else if f == *n {
        Vgcd::Collapsed
    } else {
        Vgcd::Nothing
    }
}

// Both conic orders were exhausted inside one gcd window: rescan the
// saved states for the step where only one of them was.
fn backtrack(n: &Uint, zn: &ZmodN, window: &[MInt], two: &MInt) -> Option<Uint> {
    for g in window {
        if let Vgcd::Factor(f) = vgcd(n, zn, g, two) {
            return Some(f);
        }
    }
    None
}

/// V_exp(u, 1) through the simple binary Lucas chain [Montgomery]:
/// 2n P is obtained by doubling nP,
/// 2n+1 P is obtained by adding nP and n+1 P.
/// This requires 2 modular multiplications per exponent bit.
pub fn lucas_v(zn: &ZmodN, g: &MInt, exp: u64) -> MInt {
    if exp == 0 {
        return zn.two();
    }
    // Compute k P and k+1 P where k = exp >> (length - i).
    // u(0P) = 2, u(1P) = g.
    let two = zn.two();
    let mut p_k = two;
    let mut p_kp1 = *g;
    let expbits = u64::BITS - u64::leading_zeros(exp);
    for i in 1..expbits {
        // For i=1, k=1
        // For i=2, k=2 or 3.
        let k = exp >> (expbits - i);
        if k % 2 == 0 {
            // (k,k+1) => (2k,2k+1)
            (p_k, p_kp1) = (
                zn.sub(&zn.mul(&p_k, &p_k), &two),
                zn.sub(&zn.mul(&p_k, &p_kp1), g),
            );
        } else {
            // (k,k+1) => (2k+1,2k+2)
            (p_k, p_kp1) = (
                zn.sub(&zn.mul(&p_k, &p_kp1), g),
                zn.sub(&zn.mul(&p_kp1, &p_kp1), &two),
            );
        }
    }
    // For the last step, no need to compute exp+1
    if exp % 2 == 0 {
        zn.sub(&zn.mul(&p_k, &p_k), &two)
    } else {
        zn.sub(&zn.mul(&p_k, &p_kp1), g)
    }
}
