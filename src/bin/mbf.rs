// Copyright 2023 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Bibliography:
//!
//! M. Morrison, J. Brillhart, A method of factoring and the factorization of F7
//! https://doi.org/10.1090/S0025-5718-1975-0371800-5
//!
//! Daniel Shanks, SQUFOF notes
//! http://homes.cerias.purdue.edu/~ssw/squfof.pdf
//!
//! Carl Pomerance, A Tale of Two Sieves
//! https://www.ams.org/notices/199612/pomerance.pdf

use std::str::FromStr;

use morbril::{factor, factorize, generate_semiprime, Algorithm, Preferences, Uint, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        return usage();
    }
    let mut prefs = Preferences::default();
    prefs.verbosity = arg
        .get::<String>("v")
        .and_then(|s| Verbosity::from_str(&s).ok())
        .unwrap_or(Verbosity::Info);
    prefs.threads = arg.get::<usize>("threads");
    prefs.fb_size = arg.get::<u32>("fb");
    prefs.pm1_bound = arg.get::<u64>("b1");
    if let Some(false) = arg.get::<bool>("parallel") {
        prefs.parallel = false;
    }
    if let Some(t) = prefs.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(t)
            .build_global()
            .expect("cannot create thread pool");
    }

    // Generator mode: print a random semiprime and its factors.
    if let Some(digits) = arg.get::<u32>("gen") {
        let (n, p, q) = generate_semiprime(digits, arg.get::<u64>("seed"));
        eprintln!("{} = {} * {}", n, p, q);
        println!("{}", n);
        return;
    }

    if arg.orphans.len() != 1 {
        return usage();
    }
    let n = match Uint::from_str(&arg.orphans[0]) {
        Ok(n) => n,
        Err(_) => {
            eprintln!("could not read decimal number {:?}", arg.orphans[0]);
            std::process::exit(1);
        }
    };
    const MAXBITS: u32 = 160;
    if n.bits() > MAXBITS {
        eprintln!(
            "Number size ({} bits) exceeds {} bits limit",
            n.bits(),
            MAXBITS
        );
        std::process::exit(1);
    }
    let algo = arg
        .get::<String>("algo")
        .map(|s| Algorithm::from_str(&s).expect("unknown algorithm name"))
        .unwrap_or(Algorithm::Auto);

    if arg.get::<bool>("all").is_some() {
        // Full factorization.
        for p in factorize(&n, &prefs) {
            println!("{}", p);
        }
    } else {
        match factor(&n, algo, &prefs) {
            Some(d) => {
                println!("{}", d);
                println!("{}", n / d);
            }
            None => {
                eprintln!("no factor found");
                println!("{}", n);
            }
        }
    }
}

fn usage() {
    println!(
        "Usage: mbf [--algo cfrac|squfof|rho|rho-combined|pm1|pm1-self|pm1-pow|pm1-smooth|pp1] \
         [--all] [--threads N] [--fb SIZE] [--b1 BOUND] [--v LEVEL] NUMBER\n\
         \x20      mbf --gen DIGITS [--seed SEED]"
    );
}
