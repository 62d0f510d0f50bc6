// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Implementation of Pollard Rho cycle finding.
//!
//! References:
//! J.M. Pollard, A Monte Carlo method for factorization, 1975
//! R.P. Brent, An improved Monte Carlo factorization algorithm, 1980
//! Peter L. Montgomery, Speeding the Pollard and Elliptic Curve methods
//! of Factorization (Math. Comp. 48, 177, 1987)
//!
//! Two engines are provided. The standard one iterates x^2 + c with
//! Brent cycle detection on 64-bit inputs and Floyd cycle detection with
//! batched GCDs on larger inputs, retrying with increasing c.
//!
//! The combined engine rotates its iteration map as the walk gets longer:
//! the Chebyshev map T2 while fewer than n^(1/9) steps have run, the
//! self-referential map x^x until n^(2/9), then x^2 + 1 (thresholds read
//! on the bit length). Cheap maps with poor mixing are tried first, the
//! robust quadratic map last.

use num_integer::Integer;

use crate::arith_montgomery::{mont_mul64, neg_inv64, MInt, ZmodN};
use crate::chebyshev::chebyshev_t2;
use crate::{params, Preferences, Uint, Verbosity};

/// The iteration maps of the rho walk. Each variant is a stateless
/// function of the previous element; the engine owns the walk state.
#[derive(Clone, Copy, Debug)]
pub enum RhoMap {
    /// x^2 + c
    Square(u64),
    /// T_2(x) = 2x^2 - 1
    ChebyshevT2,
    /// x^x (the exponent is the integer value of x)
    SelfPower,
}

impl RhoMap {
    fn next(&self, zn: &ZmodN, x: &MInt) -> MInt {
        match self {
            RhoMap::Square(c) => {
                let c = zn.from_int(Uint::from(*c) % zn.n);
                zn.add(&zn.mul(x, x), &c)
            }
            RhoMap::ChebyshevT2 => chebyshev_t2(zn, x),
            RhoMap::SelfPower => {
                let e = zn.to_int(*x);
                zn.pow(x, &e)
            }
        }
    }
}

/// Standard Pollard rho: f(x) = x^2 + c, restarting with the next c on a
/// collision.
pub fn rho(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let iters = params::rho_iters(n.bits());
    for c in 1..=3_u64 {
        if n.bits() <= 62 {
            // Brent variant on machine words.
            if let Some((p, _)) = rho64(n.digits()[0], 1 + c, iters) {
                if prefs.verbosity >= Verbosity::Info {
                    eprintln!("Pollard rho found factor {p} (c={c})");
                }
                return Some(Uint::from(p));
            }
        } else if let Some(p) = rho_floyd(n, RhoMap::Square(c), iters, prefs) {
            if prefs.verbosity >= Verbosity::Info {
                eprintln!("Pollard rho found factor {p} (c={c})");
            }
            return Some(p);
        }
    }
    None
}

/// The combined rho: one walk whose map rotates at size thresholds.
pub fn rho_combined(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    let bits = n.bits();
    // n^(1/9), n^(2/9), n^(2/5) as step counts.
    let t1 = 1_u64 << (bits / 9).min(62);
    let t2 = 1_u64 << (2 * bits / 9).min(62);
    let t3 = 1_u64 << (2 * bits / 5).min(62);
    let iters = std::cmp::max(t3, params::rho_iters(bits));
    let map = move |i: u64| -> RhoMap {
        if i < t1 {
            RhoMap::ChebyshevT2
        } else if i < t2 {
            RhoMap::SelfPower
        } else {
            RhoMap::Square(1)
        }
    };
    let zn = ZmodN::new(*n);
    // A walk that collides on both factors at once is restarted from the
    // next seed.
    'seeds: for seed in [2_u64, 3, 5] {
        let mut x1 = zn.from_int(Uint::from(seed));
        let mut x2 = x1;
        let mut diffs: Vec<MInt> = Vec::with_capacity(64);
        let mut prod = zn.one();
        for i in 0..iters {
            let f = map(i);
            x1 = f.next(&zn, &x1);
            x2 = f.next(&zn, &f.next(&zn, &x2));
            let d = zn.sub(&x2, &x1);
            prod = zn.mul(&prod, &d);
            diffs.push(d);
            if diffs.len() == 64 || i + 1 == iters {
                match gcd_pass(n, &prod, &diffs) {
                    GcdPass::Factor(p) => {
                        if prefs.verbosity >= Verbosity::Info {
                            eprintln!("Pollard rho (combined) found factor {p} after {i} steps");
                        }
                        return Some(p);
                    }
                    GcdPass::Collision => continue 'seeds,
                    GcdPass::Nothing => {}
                }
                diffs.clear();
                prod = zn.one();
            }
        }
    }
    None
}

enum GcdPass {
    Factor(Uint),
    Collision,
    Nothing,
}

// Batched GCD with backtracking: if the whole product collapses to n,
// rescan the saved differences one by one.
fn gcd_pass(n: &Uint, prod: &MInt, diffs: &[MInt]) -> GcdPass {
    let g = Integer::gcd(n, &prod.0);
    if g == Uint::ONE {
        return GcdPass::Nothing;
    }
    if g < *n {
        return GcdPass::Factor(g);
    }
    for d in diffs {
        let g = Integer::gcd(n, &d.0);
        if g > Uint::ONE && g < *n {
            return GcdPass::Factor(g);
        }
    }
    GcdPass::Collision
}

// Floyd cycle detection with batched GCDs over the Montgomery ring.
fn rho_floyd(n: &Uint, map: RhoMap, iters: u64, prefs: &Preferences) -> Option<Uint> {
    let zn = ZmodN::new(*n);
    let mut x1 = zn.from_int(Uint::from(2_u64));
    let mut x2 = x1;
    let mut diffs: Vec<MInt> = Vec::with_capacity(128);
    let mut prod = zn.one();
    for i in 0..iters {
        x1 = map.next(&zn, &x1);
        x2 = map.next(&zn, &map.next(&zn, &x2));
        let d = zn.sub(&x2, &x1);
        prod = zn.mul(&prod, &d);
        diffs.push(d);
        if diffs.len() == 128 || i + 1 == iters {
            match gcd_pass(n, &prod, &diffs) {
                GcdPass::Factor(p) => {
                    if prefs.verbosity >= Verbosity::Verbose {
                        eprintln!("rho walk hit a factor after {i} steps");
                    }
                    return Some(p);
                }
                GcdPass::Collision => return None,
                GcdPass::Nothing => {}
            }
            diffs.clear();
            prod = zn.one();
        }
    }
    None
}

/// Factor a 64-bit odd composite with Brent's cycle finding: the walk
/// doubles in length between anchor updates, the whole second half of
/// each round is compared against the anchor, and gcds are taken on
/// batched difference products with a stepwise replay when the batch
/// collapses.
///
/// The squaring map runs directly on Montgomery residues: conjugating
/// the iteration by a fixed bijection of the ring changes neither cycle
/// lengths nor which differences vanish mod a factor.
pub fn rho64(n: u64, seed: u64, budget: u64) -> Option<(u64, u64)> {
    const BATCH: u64 = 96;
    let nninv = neg_inv64(n);
    let step = |x: u64| mont_mul64(n, nninv, x, x) + 1;
    let mut y = seed % n;
    let mut walk: u64 = 1;
    let mut spent: u64 = 0;
    while spent < budget {
        // First half of the round positions the anchor.
        let anchor = y;
        for _ in 0..walk {
            y = step(y);
        }
        spent += walk;
        let mut done: u64 = 0;
        while done < walk && spent < budget {
            let chunk = BATCH.min(walk - done);
            let rescue = y;
            let mut acc = 1_u64;
            for _ in 0..chunk {
                y = step(y);
                acc = mont_mul64(n, nninv, acc, anchor.abs_diff(y));
            }
            spent += chunk;
            done += chunk;
            let g = Integer::gcd(&n, &acc);
            if g == 1 {
                continue;
            }
            if g < n {
                return Some((g, n / g));
            }
            // The whole batch collapsed: replay it one difference at a
            // time from the saved state.
            let mut z = rescue;
            for _ in 0..chunk {
                z = step(z);
                let g = Integer::gcd(&n, &anchor.abs_diff(z));
                if g > 1 && g < n {
                    return Some((g, n / g));
                }
            }
            // Both factors met the anchor at once; a new seed is needed.
            return None;
        }
        walk *= 2;
    }
    None
}
