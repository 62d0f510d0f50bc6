// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Multiprecision and modular arithmetic helpers shared by every
//! engine: powering, square roots (integer and modular), inverses,
//! and precomputed division by factor base primes.

use std::ops::{Shl, Shr};
use std::str::FromStr;

pub use num_integer::sqrt as isqrt;
use num_integer::{Integer, Roots};
use num_traits::{One, Pow, ToPrimitive};

pub use bnum::types::{I512, U256, U512};
use bnum::{BInt, BUint};

use crate::Error;

/// Integer-like types accepted by the generic helpers: u64 and the
/// bnum wide integers.
pub trait Num:
    Integer
    + One
    + Copy
    + Clone
    + Shl<usize, Output = Self>
    + Shr<usize, Output = Self>
    + From<u64>
    + FromStr
{
    fn bits(&self) -> u32;

    fn to_u64(&self) -> Option<u64>;
    fn low_u64(&self) -> u64;
}

impl Num for u64 {
    fn bits(&self) -> u32 {
        u64::BITS - u64::leading_zeros(*self)
    }

    fn to_u64(&self) -> Option<u64> {
        Some(*self)
    }
    fn low_u64(&self) -> u64 {
        *self
    }
}

impl<const N: usize> Num for BInt<N> {
    fn bits(&self) -> u32 {
        Self::bits(self)
    }

    fn to_u64(&self) -> Option<u64> {
        ToPrimitive::to_u64(self)
    }

    fn low_u64(&self) -> u64 {
        self.to_bits().digits()[0]
    }
}

impl<const N: usize> Num for BUint<N> {
    fn bits(&self) -> u32 {
        Self::bits(self)
    }

    fn to_u64(&self) -> Option<u64> {
        ToPrimitive::to_u64(self)
    }

    fn low_u64(&self) -> u64 {
        self.digits()[0]
    }
}

/// Floor of the k-th root of n.
pub fn kth_root<T: Roots + Copy>(n: T, k: u32) -> Result<T, Error> {
    if k == 0 {
        return Err(Error::InvalidInput);
    }
    Ok(n.nth_root(k))
}

/// Signed k-th root: even degrees reject negative radicands.
pub fn kth_root_signed<const N: usize>(n: BInt<N>, k: u32) -> Result<BInt<N>, Error> {
    if k == 0 || (n.is_negative() && k % 2 == 0) {
        return Err(Error::InvalidInput);
    }
    if n.is_negative() {
        Ok(-BInt::from_bits(n.abs().to_bits().nth_root(k)))
    } else {
        Ok(BInt::from_bits(n.to_bits().nth_root(k)))
    }
}

/// Modular exponentiation (plain binary ladder).
pub fn pow_mod<T: Num>(n: T, k: T, p: T) -> T {
    let mut res: T = T::one();
    let zero = T::zero();
    let mut nn = n % p;
    let mut k = k;
    while k > zero {
        if k.low_u64() % 2 == 1 {
            res = (res * nn) % p;
        }
        nn = (nn * nn) % p;
        k = k >> 1;
    }
    res
}

pub fn mulmod<T: Num>(a: T, b: T, p: T) -> T {
    (a * b) % p
}

/// Legendre symbol of a modulo an odd prime p, through the Euler
/// criterion a^((p-1)/2).
pub fn legendre<T: Num>(a: T, p: T) -> i8 {
    debug_assert!(p.low_u64() % 2 == 1 && p > T::from(2));
    let r = pow_mod(a % p, p >> 1, p);
    if r == T::zero() {
        0
    } else if r == T::one() {
        1
    } else {
        debug_assert!(r == p - T::one());
        -1
    }
}

/// Square root modulo an odd prime p (Tonelli-Shanks).
///
/// Returns None when n is a quadratic non-residue.
pub fn sqrt_mod<T: Num>(n: T, p: T) -> Option<T> {
    let n: T = n % p;
    if n == T::zero() {
        return Some(T::zero());
    }
    let one = T::one();
    if p == T::from(2) {
        return Some(n);
    }
    if legendre(n, p) != 1 {
        return None;
    }
    if p % T::from(4) == T::from(3) {
        // n^((p+1)/4) is a root when p = 4k+3.
        let r = pow_mod(n, (p >> 2) + one, p);
        debug_assert!(mulmod(r, r, p) == n);
        return Some(r);
    }
    // p-1 = q 2^s with q odd
    let mut q = p >> 1;
    let mut s = 1_u32;
    while q.low_u64() % 2 == 0 {
        q = q >> 1;
        s += 1;
    }
    // Any non-residue will do as the order 2^s generator seed.
    let mut z = T::from(2);
    while legendre(z, p) != -1 {
        z = z + one;
    }
    let mut m = s;
    let mut c = pow_mod(z, q, p);
    let mut t = pow_mod(n, q, p);
    let mut r = pow_mod(n, (q >> 1) + one, p);
    while t != one {
        // Least i with t^(2^i) = 1 (0 < i < m, guaranteed to exist).
        let mut i = 0_u32;
        let mut t2i = t;
        while t2i != one {
            t2i = mulmod(t2i, t2i, p);
            i += 1;
        }
        let mut b = c;
        for _ in 0..m - i - 1 {
            b = mulmod(b, b, p);
        }
        m = i;
        c = mulmod(b, b, p);
        t = mulmod(t, c, p);
        r = mulmod(r, b, p);
    }
    debug_assert!(mulmod(r, r, p) == n);
    Some(r)
}

/// Modular inversion through the extended GCD.
pub fn inv_mod<const N: usize>(n: BUint<N>, m: BUint<N>) -> Result<BUint<N>, Error> {
    let e = Integer::extended_gcd(&BInt::<N>::from_bits(n % m), &BInt::<N>::from_bits(m));
    if e.gcd != BInt::ONE {
        return Err(Error::NoInverse);
    }
    let x = if e.x.is_negative() {
        e.x + BInt::from_bits(m)
    } else {
        e.x
    };
    Ok(x.to_bits() % m)
}

/// Modular inversion for 64-bit moduli.
pub fn inv_mod64(n: u64, p: u64) -> Option<u64> {
    let e = Integer::extended_gcd(&(n as i64), &(p as i64));
    if e.gcd == 1 {
        let x = if e.x < 0 { e.x + p as i64 } else { e.x };
        assert!(x >= 0);
        Some(x as u64 % p)
    } else {
        None
    }
}

/// Tests whether n can be written as p^k for k <= 20.
/// This is enough for the driver: trial division already caught
/// any factor small enough to appear with exponent above 20.
pub fn perfect_power<N>(n: N) -> Option<(N, u32)>
where
    N: Copy + Roots + Pow<u32, Output = N>,
{
    for k in [2, 3, 5, 7, 11, 13, 17, 19_u32] {
        let r = n.nth_root(k);
        if r.pow(k) == n {
            if let Some((rr, kk)) = perfect_power(r) {
                return Some((rr, k * kk));
            }
            return Some((r, k));
        }
    }
    None
}

/// Division by a fixed small prime through reciprocal multiplication,
/// replacing the hardware divider in the trial division hot loop.
///
/// The magic constant is ceil(2^(64+l) / p) - 2^64 with l = ceil(log2 p)
/// (Granlund and Montgomery, "Division by invariant integers using
/// multiplication"): the 65th bit of the reciprocal is recovered by the
/// add-and-halve step in [`Dividers::divmod64`], and the quotient is
/// exact for every 64-bit operand, no correction needed.
#[derive(Clone, Copy, Debug)]
pub struct Dividers {
    p: u64,
    magic: u64,
    shift: u32,
}

impl Dividers {
    /// p must be a prime below 2^32.
    pub fn new(p: u32) -> Self {
        assert!(p >= 2);
        let l = 32 - (p - 1).leading_zeros();
        let m = ((1_u128 << (64 + l)) + p as u128 - 1) / p as u128;
        // 2^l >= p so the reciprocal has exactly 65 bits.
        Dividers {
            p: p as u64,
            magic: (m - (1 << 64)) as u64,
            shift: l,
        }
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    #[inline]
    pub fn divmod64(&self, x: u64) -> (u64, u64) {
        let t = ((x as u128 * self.magic as u128) >> 64) as u64;
        let q = (t + ((x - t) >> 1)) >> (self.shift - 1);
        (q, x - q * self.p)
    }

    /// Long division, limb by limb in 32-bit halves so that every
    /// partial dividend (remainder shifted up plus the next half-limb)
    /// stays below 2^64.
    pub fn divmod_uint<const N: usize>(&self, x: &BUint<N>) -> (BUint<N>, u64) {
        debug_assert!(self.p >> 32 == 0);
        let mut quot = [0_u64; N];
        let mut rem: u64 = 0;
        for i in (0..N).rev() {
            let limb = x.digits()[i];
            let (qhi, r) = self.divmod64(rem << 32 | limb >> 32);
            let (qlo, r) = self.divmod64(r << 32 | limb & 0xffff_ffff);
            quot[i] = qhi << 32 | qlo;
            rem = r;
        }
        (BUint::from_digits(quot), rem)
    }

    pub fn mod_uint<const N: usize>(&self, x: &BUint<N>) -> u64 {
        let mut rem: u64 = 0;
        for i in (0..N).rev() {
            let limb = x.digits()[i];
            rem = self.divmod64(rem << 32 | limb >> 32).1;
            rem = self.divmod64(rem << 32 | limb & 0xffff_ffff).1;
        }
        rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Uint;

    #[test]
    fn test_pow_mod() {
        // Small exact powers.
        assert_eq!(pow_mod(2_u64, 10, 1 << 20), 1024);
        assert_eq!(pow_mod(7_u64, 3, 1000), 343);
        // Fermat, and the exponent identity a^7 = a^2 a^5.
        for p in [10007_u64, 1000003, 999983] {
            assert_eq!(pow_mod(3, p - 1, p), 1);
            for a in [2_u64, 17, 912673, p - 2] {
                let lhs = pow_mod(a, 7, p);
                let rhs = mulmod(pow_mod(a, 2, p), pow_mod(a, 5, p), p);
                assert_eq!(lhs, rhs, "a={a} p={p}");
            }
        }
        // Multiprecision operands.
        let m = Uint::from(1_000_036_000_099_u64); // 1000003 * 1000033
        let g = Uint::from(5_u64);
        let e1 = Uint::from(123_456_u64);
        let e2 = Uint::from(654_321_u64);
        let prod = pow_mod(pow_mod(g, e1, m), e2, m);
        assert_eq!(prod, pow_mod(g, e1 * e2, m));
    }

    #[test]
    fn test_legendre() {
        // 997 = 4k+1: -1 is a residue; 1019 = 4k+3: it is not.
        assert_eq!(legendre(996_u64, 997), 1);
        assert_eq!(legendre(1018_u64, 1019), -1);
        for p in [997_u64, 1019, 65537] {
            let mut residues = 0;
            for a in 1..100 {
                let l = legendre(a, p);
                assert_eq!(l, legendre(a * a % p, p) * l);
                if l == 1 {
                    residues += 1;
                }
            }
            assert!(residues > 30);
        }
    }

    #[test]
    fn test_sqrt_mod() {
        // Mix of p=4k+3, p=4k+1 and primes with high 2-adic valuation
        // of p-1 (12289 = 3*2^12 + 1, 786433 = 3*2^18 + 1).
        const PRIMES: &[u32] = &[
            2473, 2503, 2521, 2531, 2539, 12289, 63977, 786433, 2500213, 2500363,
        ];
        for &p in PRIMES {
            let p = p as u64;
            for k in 1..std::cmp::min(p / 2, 2000) {
                if let Some(r) = sqrt_mod(k, p) {
                    assert_eq!(k, mulmod(r, r, p), "sqrt({k}) mod {p} = {r}");
                }
                let r = sqrt_mod(k * k % p, p);
                assert!(
                    r == Some(k) || r == Some(p - k),
                    "failed sqrt({}) mod {} got {:?}",
                    (k * k) % p,
                    p,
                    r
                )
            }
        }
    }

    #[test]
    fn test_sqrt_mod_uint() {
        use std::str::FromStr;
        let p = Uint::from_str("2500213").unwrap();
        let r = sqrt_mod(Uint::from(2_u64), p).unwrap();
        assert_eq!((r * r) % p, Uint::from(2_u64));
    }

    #[test]
    fn test_inv_mod() {
        let p = Uint::from(2500363_u64);
        for k in 1..1000_u64 {
            let k = Uint::from(k);
            let kinv = inv_mod(k, p).unwrap();
            assert_eq!((k * kinv) % p, Uint::ONE);
        }
        // Non-coprime arguments have no inverse.
        let m = Uint::from(1000_u64);
        assert_eq!(inv_mod(Uint::from(50_u64), m), Err(Error::NoInverse));
    }

    #[test]
    fn test_isqrt() {
        // The floor property around exact squares, at several magnitudes.
        let mut x = Uint::from(99_991_u64);
        for _ in 0..3 {
            x = x * x + Uint::from(7_u64); // 10, 20, 40-digit samples
            let r = isqrt(x);
            assert!(r * r <= x && x < (r + Uint::ONE) * (r + Uint::ONE), "x={x}");
            let sq = r * r;
            assert_eq!(isqrt(sq), r);
            assert_eq!(isqrt(sq - Uint::ONE), r - Uint::ONE);
            assert_eq!(isqrt(sq + Uint::ONE), r);
        }
        assert_eq!(isqrt(Uint::ZERO), Uint::ZERO);
        assert_eq!(isqrt(Uint::from(3_u64)), Uint::ONE);
    }

    #[test]
    fn test_kth_root() {
        let n = Uint::from(12345678901234567890_u64);
        for k in 1..=20_u32 {
            let r = kth_root(n, k).unwrap();
            assert!(r.pow(k) <= n);
            assert!((r + Uint::ONE).pow(k) > n);
        }
        assert_eq!(kth_root(n, 0), Err(Error::InvalidInput));
        use crate::Int;
        assert_eq!(kth_root_signed(Int::from(-27), 3), Ok(Int::from(-3)));
        assert_eq!(kth_root_signed(Int::from(-27), 2), Err(Error::InvalidInput));
    }

    #[test]
    fn test_dividers() {
        use crate::fbase::primes;
        // Pseudo-random dividends checked against the hardware divider,
        // plus exact multiples and near-overflow operands.
        let mut x = 0x0123_4567_89ab_cdef_u64;
        for p in primes(500) {
            let d = Dividers::new(p);
            let p = p as u64;
            for k in 0..200_u64 {
                x = x
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                for v in [x, k, p * k, p * k + p - 1, u64::MAX - k] {
                    assert_eq!((v / p, v % p), d.divmod64(v), "v={v} p={p}");
                }
            }
        }
    }

    #[test]
    fn test_dividers_uint() {
        use crate::fbase::primes;
        use std::str::FromStr;

        let vals: &[Uint] = &[
            Uint::from(10_u64).pow(40) + Uint::from(123_456_789_u64),
            (Uint::ONE << 255) - Uint::ONE,
            Uint::from_str("56772286057224175134407894536228864081").unwrap(),
        ];
        for &v in vals {
            for p in primes(2000) {
                let d = Dividers::new(p);
                let p = p as u64;
                assert_eq!((v / p, v % p), d.divmod_uint(&v), "p={p}");
                assert_eq!(v % p, d.mod_uint(&v));
                // Exact multiples leave no remainder.
                let w = v - Uint::from(v % p);
                assert_eq!(d.mod_uint(&w), 0);
            }
        }
    }

    #[test]
    fn test_perfect_power() {
        assert_eq!(perfect_power(59049_u64), Some((3, 10)));
        assert_eq!(perfect_power(1024_u64), Some((2, 10)));
        assert_eq!(
            perfect_power(1_000_000_000_000_000_000_u64),
            Some((10, 18))
        );
        assert_eq!(perfect_power(59051_u64), None);
        // Prime exponent on a multiprecision base.
        let n = Uint::from(1009_u64).pow(7);
        assert_eq!(perfect_power(n), Some((Uint::from(1009_u64), 7)));
    }
}
