// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::Uint;

/// Factor base size for CFRAC, a subexponential function of the input
/// size: max(200, exp(0.4 sqrt(ln n ln ln n))).
pub fn fb_size(n: &Uint) -> u32 {
    let logn = n.bits() as f64 * std::f64::consts::LN_2;
    let b = (0.4 * (logn * logn.ln()).sqrt()).exp();
    std::cmp::max(200, b as u32)
}

/// Smoothness bound for the reference Pollard P-1:
/// exp(sqrt(ln n ln ln n) / sqrt 2), clamped to [1e3, 1e15].
pub fn pm1_bound(n: &Uint) -> u64 {
    let logn = n.bits() as f64 * std::f64::consts::LN_2;
    let b = ((logn * logn.ln()).sqrt() / std::f64::consts::SQRT_2).exp();
    b.clamp(1e3, 1e15) as u64
}

/// Iteration budgets for the Pollard rho variants, by input size.
pub fn rho_iters(bits: u32) -> u64 {
    match bits {
        0..=24 => 5_000,
        25..=48 => 50_000,
        49..=80 => 500_000,
        81..=128 => 2_000_000,
        _ => 8_000_000,
    }
}

/// Ceiling for a single SQUFOF multiplier, on top of the
/// 3 (kn)^(1/4) + 100 estimate.
pub const SQUFOF_MAX_ITERS: u64 = 1 << 22;

/// Default sieving batch: the convergent recurrence is serial, smoothness
/// testing of a batch is parallel.
pub const CFRAC_BATCH_SIZE: usize = 2000;

/// Default oversampling of relations above the factor base size.
pub const CFRAC_MARGIN: u32 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fb_size() {
        // 20 digits => a few hundred primes, 45 digits => a few thousand.
        let b20 = fb_size(&(Uint::from(10_u64).pow(20)));
        let b38 = fb_size(&(Uint::from(10_u64).pow(38)));
        let b45 = fb_size(&(Uint::from(10_u64).pow(45)));
        assert!(b20 >= 200 && b20 <= 600, "b20={b20}");
        assert!(b38 >= 1500 && b38 <= 4000, "b38={b38}");
        assert!(b45 >= b38 && b45 <= 10000, "b45={b45}");
    }

    #[test]
    fn test_pm1_bound() {
        let b20 = pm1_bound(&(Uint::from(10_u64).pow(20)));
        let b45 = pm1_bound(&(Uint::from(10_u64).pow(45)));
        assert!((1000..=100_000).contains(&b20), "b20={b20}");
        assert!(b45 >= b20 && b45 <= 50_000_000, "b45={b45}");
    }
}
