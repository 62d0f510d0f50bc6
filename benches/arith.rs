use brunch::Bench;
use std::str::FromStr;

use morbril::arith::{isqrt, pow_mod, sqrt_mod};
use morbril::arith_montgomery::ZmodN;
use morbril::cont_frac::SqrtContFrac;
use morbril::{pseudoprime, Uint};

const N38: &str = "56772286057224175134407894536228864081";
// The Mersenne prime 2^89 - 1.
const P27: &str = "618970019642690137449562111";

brunch::benches! {
    Bench::new("isqrt(u38)").run_seeded(Uint::from_str(N38).unwrap(), isqrt),
    Bench::new("sqrt_mod(k, 2500213)")
        .with_samples(10_000)
        .run_seeded(1234_u64, |k| sqrt_mod(k, 2500213_u64)),
    {
        let n = Uint::from_str(N38).unwrap();
        let zn = ZmodN::new(n);
        let x = zn.from_int(Uint::from(65537_u64));
        Bench::new("1000x ZmodN::mul")
            .run_seeded(x, |x| for _ in 0..1000 { zn.mul(&x, &x); })
    },
    {
        let n = Uint::from_str(N38).unwrap();
        let e = (Uint::ONE << 300) + Uint::from(12345_u64);
        let zn = ZmodN::new(n);
        let x = zn.from_int(Uint::from(65537_u64));
        Bench::new("ZmodN::pow (300-bit exponent)")
            .run_seeded(x, |x| zn.pow(&x, &e))
    },
    Bench::new("pow_mod(u38)").run_seeded(Uint::from_str(N38).unwrap(), |n| {
        pow_mod(Uint::from(65537_u64), n - Uint::ONE, n)
    }),
    Bench::new("1000 convergents of sqrt(n38)")
        .run_seeded(Uint::from_str(N38).unwrap(), |n| {
            SqrtContFrac::new(n).take(1000).count()
        }),
    Bench::new("miller_rabin(p27)")
        .run_seeded(Uint::from_str(P27).unwrap(), |p| pseudoprime(p)),
}
