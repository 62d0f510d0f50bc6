// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Montgomery form arithmetic for odd moduli, in two flavours: a 64-bit
//! specialization backing the Pollard rho fast path, and a
//! multiprecision ring [`ZmodN`] shared by all engines.
//!
//! Inverses modulo a power of two come from Hensel lifting: for odd n,
//! x = n is already an inverse of n modulo 8, and every Newton step
//! x <- x(2 - nx) doubles the number of correct low bits.
//!
//! The multiprecision ring requires the modulus to occupy at most half
//! of [`Uint`]. That headroom lets every product of reduced residues use
//! the plain full-width multiplication, and R itself (2^64w for a w-word
//! modulus) is a representable power of two, so no half-width
//! multiplication tricks are needed anywhere.

use crate::arith;
use crate::Uint;

// 64-bit moduli.

/// -1/n mod 2^64 for odd n.
pub fn neg_inv64(n: u64) -> u64 {
    debug_assert!(n & 1 == 1);
    // 3 correct bits to start, 5 liftings reach 96 > 64.
    let mut x = n;
    for _ in 0..5 {
        x = x.wrapping_mul(2_u64.wrapping_sub(n.wrapping_mul(x)));
    }
    debug_assert!(n.wrapping_mul(x) == 1);
    x.wrapping_neg()
}

/// REDC: t / 2^64 mod n for a double-word t < n * 2^64.
#[inline(always)]
pub fn mont_reduce64(n: u64, nninv: u64, t: u128) -> u64 {
    // k n = -t mod 2^64, so t + k n is an exact multiple of 2^64
    // and the shifted sum is below 2n.
    let k = (t as u64).wrapping_mul(nninv);
    let folded = ((t + k as u128 * n as u128) >> 64) as u64;
    if folded < n {
        folded
    } else {
        folded - n
    }
}

/// Product of two Montgomery residues.
#[inline(always)]
pub fn mont_mul64(n: u64, nninv: u64, x: u64, y: u64) -> u64 {
    mont_reduce64(n, nninv, x as u128 * y as u128)
}

/// Montgomery arithmetic for an odd multiprecision modulus
/// (at most [`Uint::BITS`]/2 - 1 bits wide).
#[derive(Clone)]
pub struct ZmodN {
    pub n: Uint,
    // -1/n mod R
    nninv: Uint,
    // log2 of the auxiliary base R
    rbits: u32,
    // The Montgomery one, R mod n.
    r: Uint,
    // R^2 mod n, to enter Montgomery form.
    r2: Uint,
}

/// A residue in Montgomery form.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MInt(pub Uint);

impl ZmodN {
    pub fn new(n: Uint) -> Self {
        assert!(n.bits() < Uint::BITS / 2);
        assert!(n.digits()[0] & 1 == 1, "modulus must be odd");
        let rbits = 64 * ((n.bits() + 63) / 64);
        // Hensel lifting as in neg_inv64; 7 wide steps exceed 256 bits.
        let two = Uint::from(2_u64);
        let mut x = n;
        for _ in 0..7 {
            x = x.wrapping_mul(two.wrapping_sub(n.wrapping_mul(x)));
        }
        debug_assert!(keep_low(n.wrapping_mul(x), rbits) == Uint::ONE);
        let nninv = keep_low(Uint::ZERO.wrapping_sub(x), rbits);
        // The modulus fits in half a word, so R is representable and
        // R mod n is a single long division away.
        let r = (Uint::ONE << rbits) % n;
        let r2 = (r * r) % n;
        ZmodN {
            n,
            nninv,
            rbits,
            r,
            r2,
        }
    }

    pub fn zero(&self) -> MInt {
        MInt(Uint::ZERO)
    }

    pub fn one(&self) -> MInt {
        MInt(self.r)
    }

    pub fn two(&self) -> MInt {
        self.add(&self.one(), &self.one())
    }

    pub fn from_int(&self, x: Uint) -> MInt {
        debug_assert!(x < self.n);
        self.redc(x * self.r2)
    }

    pub fn to_int(&self, x: MInt) -> Uint {
        self.redc(x.0).0
    }

    pub fn mul(&self, x: &MInt, y: &MInt) -> MInt {
        debug_assert!(x.0 < self.n && y.0 < self.n);
        self.redc(x.0 * y.0)
    }

    pub fn inv(&self, x: &MInt) -> Option<MInt> {
        // No optimization, use ordinary modular inversion.
        Some(self.from_int(arith::inv_mod(self.to_int(*x), self.n).ok()?))
    }

    pub fn add(&self, x: &MInt, y: &MInt) -> MInt {
        // Operands are reduced, one conditional subtraction suffices.
        let s = x.0 + y.0;
        MInt(if s >= self.n { s - self.n } else { s })
    }

    pub fn sub(&self, x: &MInt, y: &MInt) -> MInt {
        MInt(if x.0 >= y.0 {
            x.0 - y.0
        } else {
            x.0 + self.n - y.0
        })
    }

    /// Modular exponentiation. Exponents of at least 256 bits go through
    /// a sliding window aggregating runs of set bits; shorter exponents
    /// use the plain binary ladder.
    pub fn pow(&self, x: &MInt, e: &Uint) -> MInt {
        let ebits = e.bits();
        if ebits == 0 {
            return self.one();
        }
        if ebits < 256 {
            let mut res = *x;
            for i in (0..ebits - 1).rev() {
                res = self.mul(&res, &res);
                if bit(e, i) {
                    res = self.mul(&res, x);
                }
            }
            return res;
        }
        // Windows always begin on a set bit so only odd powers are needed.
        let w: u32 = if ebits < 384 { 4 } else { 5 };
        let x2 = self.mul(x, x);
        let mut table = Vec::with_capacity(1 << (w - 1));
        table.push(*x);
        for i in 1..(1usize << (w - 1)) {
            let prev = table[i - 1];
            table.push(self.mul(&prev, &x2));
        }
        let mut res = self.one();
        let mut i = ebits as i64 - 1;
        while i >= 0 {
            if !bit(e, i as u32) {
                res = self.mul(&res, &res);
                i -= 1;
                continue;
            }
            // Take the longest window i..=j with a set low bit.
            let mut j = std::cmp::max(i - w as i64 + 1, 0);
            while !bit(e, j as u32) {
                j += 1;
            }
            let mut v = 0usize;
            for b in (j..=i).rev() {
                res = self.mul(&res, &res);
                v = (v << 1) | bit(e, b as u32) as usize;
            }
            res = self.mul(&res, &table[(v - 1) / 2]);
            i = j - 1;
        }
        res
    }

    // REDC over Uint: t/R mod n for t < nR. Since t, kn < 2^511 the sum
    // never wraps, and shifting does the division by R.
    fn redc(&self, t: Uint) -> MInt {
        debug_assert!(t < (self.n << self.rbits));
        let k = keep_low(t.wrapping_mul(self.nninv), self.rbits);
        let folded = (t + k * self.n) >> self.rbits;
        MInt(if folded >= self.n {
            folded - self.n
        } else {
            folded
        })
    }
}

// Truncate to the low `bits` bits.
#[inline]
fn keep_low(x: Uint, bits: u32) -> Uint {
    (x << (Uint::BITS - bits)) >> (Uint::BITS - bits)
}

#[inline]
fn bit(e: &Uint, i: u32) -> bool {
    (e.digits()[(i / 64) as usize] >> (i % 64)) & 1 == 1
}
