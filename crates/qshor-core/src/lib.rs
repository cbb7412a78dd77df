//! `qshor-core`: Shor's factoring algorithm on the qshor statevector simulator.
//!
//! The classical parts (gcd, modular exponentiation, perfect powers,
//! continued fractions, primality) live in [`number_theory`]. Order finding
//! runs quantum phase estimation over the permutation `x -> a·x mod N`
//! ([`modmul`], [`order`]). The [`Shor`] driver ties them together with the
//! retry loop and full factorization.
//!
//! # Example
//!
//! ```rust
//! use qshor_core::full_factorization;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let primes = full_factorization(15, &mut rng, 10).unwrap();
//! assert_eq!(primes, vec![3, 5]);
//! ```
//!
//! All randomness is injected; seeded generators reproduce runs exactly.

pub mod config;
pub mod driver;
pub mod error;
pub mod modmul;
pub mod number_theory;
pub mod order;

pub use config::{PhaseEstimation, ShorConfig};
pub use driver::{
    Factor, FactorResult, FactorSource, RetryReason, Shor, factor, factor_once, factor_parallel,
    full_factorization,
};
pub use error::{ShorError, ShorResult};
pub use modmul::{ModularMultiplier, build_mod_mult_operator};
pub use number_theory::{
    ContinuedFraction, Convergent, Convergents, PerfectPower, continued_fraction_convergents, gcd,
    is_perfect_power, is_prime, mod_inverse, mod_pow,
};
pub use order::{CircuitLayout, MeasurementOutcome, OrderEstimate, OrderFinder, find_order};
pub use qshor_sim::ErrorKind;
