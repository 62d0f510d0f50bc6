// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Factorization driver: input screening, engine dispatch and recursive
//! splitting into prime factors.

use std::str::FromStr;

use crate::arith::{isqrt, perfect_power};
use crate::primality::is_probable_prime;
use crate::{cfrac, fbase, pollard_pm1, pollard_rho, pp1, squfof};
use crate::{Error, Uint, Verbosity};

/// The closed set of factoring engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Cfrac,
    Squfof,
    RhoStandard,
    RhoCombined,
    Pm1Standard,
    Pm1SelfRef,
    Pm1PowMod,
    Pm1Smooth,
    Pp1,
    /// Cascade through quick engines before CFRAC.
    Auto,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "cfrac" => Ok(Algorithm::Cfrac),
            "squfof" => Ok(Algorithm::Squfof),
            "rho" => Ok(Algorithm::RhoStandard),
            "rho-combined" => Ok(Algorithm::RhoCombined),
            "pm1" => Ok(Algorithm::Pm1Standard),
            "pm1-self" => Ok(Algorithm::Pm1SelfRef),
            "pm1-pow" => Ok(Algorithm::Pm1PowMod),
            "pm1-smooth" => Ok(Algorithm::Pm1Smooth),
            "pp1" => Ok(Algorithm::Pp1),
            "auto" => Ok(Algorithm::Auto),
            _ => Err(Error::InvalidInput),
        }
    }
}

/// Tuning knobs shared by the engines. The defaults match the published
/// parameter choices of each algorithm.
#[derive(Clone, Debug)]
pub struct Preferences {
    pub verbosity: Verbosity,
    /// Optional rayon pool size (the global pool by default).
    pub threads: Option<usize>,
    /// CFRAC factor base size override (at least 50).
    pub fb_size: Option<u32>,
    /// Relations collected above the factor base size.
    pub relation_margin: u32,
    /// Convergents per sieving batch.
    pub batch_size: usize,
    /// Parallel smoothness testing and factor base construction.
    pub parallel: bool,
    /// Smoothness bound override for P-1/P+1.
    pub pm1_bound: Option<u64>,
    /// Primes between gcd tests in the P-1 family.
    pub gcd_interval: usize,
    /// Exponentiation base for the P-1 family.
    pub pm1_base: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            verbosity: Verbosity::Silent,
            threads: None,
            fb_size: None,
            relation_margin: crate::params::CFRAC_MARGIN,
            batch_size: crate::params::CFRAC_BATCH_SIZE,
            parallel: true,
            pm1_bound: None,
            gcd_interval: 20,
            pm1_base: 2,
        }
    }
}

/// The engine entry point behind an [`Algorithm`] value, mostly useful
/// for tests exercising one engine in isolation.
pub fn choose_algorithm(algo: Algorithm) -> fn(&Uint, &Preferences) -> Option<Uint> {
    match algo {
        Algorithm::Cfrac => cfrac::cfrac,
        Algorithm::Squfof => squfof::squfof,
        Algorithm::RhoStandard => pollard_rho::rho,
        Algorithm::RhoCombined => pollard_rho::rho_combined,
        Algorithm::Pm1Standard => pollard_pm1::pm1_standard,
        Algorithm::Pm1SelfRef => pollard_pm1::pm1_selfref,
        Algorithm::Pm1PowMod => pollard_pm1::pm1_powmod,
        Algorithm::Pm1Smooth => pollard_pm1::pm1_smooth,
        Algorithm::Pp1 => pp1::pp1,
        Algorithm::Auto => auto,
    }
}

// SQUFOF iteration counts grow like (kn)^(1/4): past 120 bits it would
// exhaust its iteration ceiling on every multiplier.
fn auto(n: &Uint, prefs: &Preferences) -> Option<Uint> {
    if n.bits() <= 64 {
        pollard_rho::rho(n, prefs)
            .or_else(|| squfof::squfof(n, prefs))
            .or_else(|| cfrac::cfrac(n, prefs))
    } else {
        pollard_pm1::pm1_smooth(n, prefs)
            .or_else(|| cfrac::cfrac(n, prefs))
            .or_else(|| {
                if n.bits() <= 120 {
                    squfof::squfof(n, prefs)
                } else {
                    None
                }
            })
    }
}

/// Returns a nontrivial divisor of n, or None when n < 2, n is prime, or
/// every engine gave up.
pub fn factor(n: &Uint, algo: Algorithm, prefs: &Preferences) -> Option<Uint> {
    let n = *n;
    if n < Uint::from(2_u64) {
        return None;
    }
    // Even numbers
    if n.digits()[0] & 1 == 0 {
        return if n == Uint::from(2_u64) {
            None
        } else {
            Some(Uint::from(2_u64))
        };
    }
    // Perfect powers (square inputs break the continued fraction and the
    // form cycle, so they are peeled first).
    let r = isqrt(n);
    if r * r == n {
        return Some(r);
    }
    if let Some((r, _)) = perfect_power(n) {
        return Some(r);
    }
    // Trial division by the primes below 1000.
    for &p in fbase::primes(168).iter() {
        let p = Uint::from(p as u64);
        if n == p {
            return None;
        }
        if n % p == Uint::ZERO {
            return Some(p);
        }
    }
    if is_probable_prime(&n) {
        return None;
    }
    choose_algorithm(algo)(&n, prefs)
}

/// Complete factorization into primes, in ascending order (with
/// multiplicity). The product of the result is always n; a composite no
/// engine could split is reported as is.
pub fn factorize(n: &Uint, prefs: &Preferences) -> Vec<Uint> {
    let mut queue = vec![*n];
    let mut out = vec![];
    while let Some(x) = queue.pop() {
        if x >= Uint::from(2_u64) && is_probable_prime(&x) {
            out.push(x);
            continue;
        }
        match factor(&x, Algorithm::Auto, prefs) {
            Some(d) if d > Uint::ONE && d < x => {
                queue.push(d);
                queue.push(x / d);
            }
            _ => {
                // Documented fallback: emit x unchanged rather than loop.
                if prefs.verbosity >= Verbosity::Info {
                    eprintln!("no engine could split {x}, keeping it as presumed prime");
                }
                out.push(x);
            }
        }
    }
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        Preferences::default()
    }

    #[test]
    fn test_factor_screening() {
        let p = prefs();
        assert_eq!(factor(&Uint::ZERO, Algorithm::Auto, &p), None);
        assert_eq!(factor(&Uint::ONE, Algorithm::Auto, &p), None);
        assert_eq!(factor(&Uint::from(2_u64), Algorithm::Auto, &p), None);
        assert_eq!(factor(&Uint::from(17_u64), Algorithm::Auto, &p), None);
        assert_eq!(
            factor(&Uint::from(1024_u64), Algorithm::Auto, &p),
            Some(Uint::from(2_u64))
        );
        // 1018081 = 1009^2
        assert_eq!(
            factor(&Uint::from(1018081_u64), Algorithm::Auto, &p),
            Some(Uint::from(1009_u64))
        );
        // 3^5 * 1009
        let d = factor(&Uint::from(243_u64 * 1009), Algorithm::Auto, &p).unwrap();
        assert_eq!(d, Uint::from(3_u64));
    }

    #[test]
    fn test_factorize_small() {
        let p = prefs();
        assert_eq!(factorize(&Uint::ONE, &p), vec![Uint::ONE]);
        let fs = factorize(&Uint::from(5040_u64), &p);
        // 5040 = 2^4 * 3^2 * 5 * 7
        let expect: Vec<Uint> = [2_u64, 2, 2, 2, 3, 3, 5, 7]
            .iter()
            .map(|&x| Uint::from(x))
            .collect();
        assert_eq!(fs, expect);
    }

    #[test]
    fn test_factorize_semiprime() {
        let p = prefs();
        let (n, f1, f2) = crate::generate_semiprime(16, Some(7));
        let mut expect = vec![f1, f2];
        expect.sort();
        assert_eq!(factorize(&n, &p), expect);
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("cfrac".parse(), Ok(Algorithm::Cfrac));
        assert_eq!("squfof".parse(), Ok(Algorithm::Squfof));
        assert_eq!("rho-combined".parse(), Ok(Algorithm::RhoCombined));
        assert!("nfs".parse::<Algorithm>().is_err());
    }
}
