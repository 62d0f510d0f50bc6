// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chebyshev polynomials T_k(x) modulo n.
//!
//! T_k is evaluated by a binary ladder over the bits of k maintaining the
//! pair (T_m, T_{m+1}) with the identities:
//!   T_{2m}   = 2 T_m^2 - 1
//!   T_{2m+1} = 2 T_m T_{m+1} - x
//!   T_{2m+2} = 2 T_{m+1}^2 - 1
//!
//! The ladder exists in two variants: an ordinary branching one, and a
//! constant-time one computing both branch outputs at every bit and
//! selecting through a mask, for callers that must not leak the exponent
//! through the branch predictor. Both return identical values.

use crate::arith_montgomery::{MInt, ZmodN};
use crate::Uint;

/// T_k(x) mod n by the branching binary ladder.
pub fn chebyshev_t(zn: &ZmodN, x: &MInt, k: u64) -> MInt {
    if k == 0 {
        return zn.one();
    }
    let (mut t, mut t1) = (*x, chebyshev_t2(zn, x));
    let kbits = u64::BITS - u64::leading_zeros(k);
    for i in (0..kbits - 1).rev() {
        let d = zn.sub(&dbl(zn, &zn.mul(&t, &t1)), x);
        if (k >> i) & 1 == 0 {
            (t, t1) = (zn.sub(&dbl(zn, &zn.mul(&t, &t)), &zn.one()), d);
        } else {
            (t, t1) = (d, zn.sub(&dbl(zn, &zn.mul(&t1, &t1)), &zn.one()));
        }
    }
    t
}

/// T_k(x) mod n without data-dependent branches: both ladder outputs are
/// computed at every bit and the pair is selected by an all-ones/all-zeros
/// mask derived from the bit.
pub fn chebyshev_t_ct(zn: &ZmodN, x: &MInt, k: u64) -> MInt {
    if k == 0 {
        return zn.one();
    }
    let (mut t, mut t1) = (*x, chebyshev_t2(zn, x));
    let kbits = u64::BITS - u64::leading_zeros(k);
    for i in (0..kbits - 1).rev() {
        let b = (k >> i) & 1;
        let d = zn.sub(&dbl(zn, &zn.mul(&t, &t1)), x);
        let e0 = zn.sub(&dbl(zn, &zn.mul(&t, &t)), &zn.one());
        let e1 = zn.sub(&dbl(zn, &zn.mul(&t1, &t1)), &zn.one());
        let mask = Uint::ZERO.wrapping_sub(Uint::from(b));
        t = select(mask, &d, &e0);
        t1 = select(mask, &e1, &d);
    }
    t
}

/// The degree 2 map T_2(x) = 2x^2 - 1, used as an iteration map by the
/// combined Pollard rho.
pub fn chebyshev_t2(zn: &ZmodN, x: &MInt) -> MInt {
    zn.sub(&dbl(zn, &zn.mul(x, x)), &zn.one())
}

#[inline]
fn dbl(zn: &ZmodN, x: &MInt) -> MInt {
    zn.add(x, x)
}

#[inline]
fn select(mask: Uint, if_one: &MInt, if_zero: &MInt) -> MInt {
    MInt((if_one.0 & mask) | (if_zero.0 & !mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_ladder() {
        // Compare against the linear recurrence T_k = 2x T_{k-1} - T_{k-2}.
        let n = Uint::from(1000003_u64);
        let zn = ZmodN::new(n);
        for x0 in [2_u64, 3, 17, 123456] {
            let x = zn.from_int(Uint::from(x0));
            let (mut tprev, mut tcur) = (zn.one(), x);
            for k in 1..200_u64 {
                assert_eq!(
                    zn.to_int(chebyshev_t(&zn, &x, k)),
                    zn.to_int(tcur),
                    "T_{k}({x0})"
                );
                (tprev, tcur) = (tcur, zn.sub(&zn.add(&zn.mul(&x, &tcur), &zn.mul(&x, &tcur)), &tprev));
            }
        }
    }

    #[test]
    fn test_chebyshev_constant_time() {
        // The masked ladder must agree bit-for-bit with the branching one.
        let n = Uint::from(2500213_u64 * 2500363);
        let zn = ZmodN::new(n);
        for x0 in [2_u64, 3, 9, 1234567, 2500212] {
            let x = zn.from_int(Uint::from(x0));
            for k in [1_u64, 2, 3, 7, 64, 65537, 0xdeadbeef, u64::MAX / 3] {
                assert_eq!(chebyshev_t(&zn, &x, k), chebyshev_t_ct(&zn, &x, k));
            }
        }
    }

    #[test]
    fn test_chebyshev_composition() {
        // T_a(T_b(x)) = T_ab(x)
        let n = Uint::from(1000003_u64);
        let zn = ZmodN::new(n);
        let x = zn.from_int(Uint::from(7_u64));
        let t6 = chebyshev_t(&zn, &x, 6);
        let t35 = chebyshev_t(&zn, &chebyshev_t(&zn, &x, 5), 7);
        assert_eq!(chebyshev_t(&zn, &t6, 35), chebyshev_t(&zn, &t35, 6));
    }
}
