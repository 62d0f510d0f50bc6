// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Factorization of small semiprimes (20-45 decimal digits) through the
//! Morrison-Brillhart continued fraction method (CFRAC), with SQUFOF and
//! the Pollard family (rho, P-1, Williams P+1) as companion engines.
//!
//! The crate exposes a library API only: [`factor`] returns a nontrivial
//! divisor, [`factorize`] a complete sorted prime factorization.

use std::fmt;
use std::str::FromStr;

pub mod arith;
pub mod arith_montgomery;
pub mod cfrac;
pub mod chebyshev;
pub mod cont_frac;
mod factor;
pub mod fbase;
pub mod matrix;
pub mod params;
pub mod pollard_pm1;
pub mod pollard_rho;
pub mod pp1;
pub mod primality;
pub mod relations;
pub mod semiprime;
pub mod squfof;

pub use crate::factor::{choose_algorithm, factor, factorize, Algorithm, Preferences};
pub use crate::semiprime::generate_semiprime;

// We need to perform modular multiplication modulo the input number.
// 512-bit words keep all intermediate products exact for 45-digit inputs.
pub type Int = arith::I512;
pub type Uint = arith::U512;

/// Shorthand for the default Miller-Rabin test.
pub fn pseudoprime(n: Uint) -> bool {
    primality::is_probable_prime(&n)
}

/// How verbose engines are on stderr. Factors always go to the caller,
/// never to the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    #[default]
    Silent,
    Info,
    Verbose,
    Debug,
}

impl FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "silent" | "0" => Ok(Verbosity::Silent),
            "info" | "1" => Ok(Verbosity::Info),
            "verbose" | "2" => Ok(Verbosity::Verbose),
            "debug" | "3" => Ok(Verbosity::Debug),
            _ => Err(Error::InvalidInput),
        }
    }
}

/// Errors raised by arithmetic primitives on invalid arguments.
///
/// An engine completing without a factor is not an error: factorization
/// functions return `None` in that case and the caller tries elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Argument outside the domain of the operation (even Montgomery
    /// modulus, zero root degree, even root of a negative number...)
    InvalidInput,
    /// Modular inverse requested for non-coprime arguments.
    NoInverse,
    /// Square root requested for a quadratic non-residue.
    NoSquareRoot,
    /// A sieve bound exceeding what fits in an addressable array.
    CapacityExceeded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput => write!(f, "invalid input"),
            Error::NoInverse => write!(f, "arguments are not coprime"),
            Error::NoSquareRoot => write!(f, "not a quadratic residue"),
            Error::CapacityExceeded => write!(f, "sieve bound exceeds capacity"),
        }
    }
}

impl std::error::Error for Error {}

/// A small prime divisor discovered where none was expected
/// (a factor base candidate dividing the input number).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnexpectedFactor(pub u64);
