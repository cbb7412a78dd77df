//! The Shor driver: classical pre-checks, order finding and the final gcds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ShorConfig;
use crate::error::{ShorError, ShorResult};
use crate::number_theory::{gcd, is_perfect_power, is_prime, mod_pow};
use crate::order::{OrderEstimate, OrderFinder};

/// How a factor was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorSource {
    /// `N` is even.
    EvenInput,
    /// `N = p^k`.
    PerfectPower {
        /// The exponent `k`.
        exponent: u32,
    },
    /// The random base already shared a factor with `N`.
    SharedBase {
        /// The base `a`.
        base: u64,
    },
    /// `gcd(a^(r/2) ± 1, N)` for the order `r` of `a`.
    OrderFinding {
        /// The base `a`.
        base: u64,
        /// The order candidate that split `N`.
        order: u64,
        /// The measured phase numerator `y`.
        measured: u64,
    },
}

impl fmt::Display for FactorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvenInput => write!(f, "even input"),
            Self::PerfectPower { exponent } => write!(f, "perfect power (k = {exponent})"),
            Self::SharedBase { base } => write!(f, "gcd with base {base}"),
            Self::OrderFinding { base, order, .. } => {
                write!(f, "order finding (a = {base}, r = {order})")
            }
        }
    }
}

/// A verified nontrivial divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// The divisor `d`, `1 < d < N`.
    pub value: u64,
    /// `N / d`.
    pub cofactor: u64,
    /// Where it came from.
    pub source: FactorSource,
}

impl Factor {
    fn new(n: u64, value: u64, source: FactorSource) -> Self {
        Self {
            value,
            cofactor: n / value,
            source,
        }
    }
}

/// Why an attempt produced no factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RetryReason {
    /// Measured `y = 0`; the phase carries no information.
    TrivialMeasurement {
        /// The base `a`.
        base: u64,
    },
    /// No candidate order was even.
    NoEvenOrder {
        /// The base `a`.
        base: u64,
        /// Candidates from the convergents.
        candidates: Vec<u64>,
    },
    /// Every even candidate gave `gcd = 1` or `gcd = N`.
    TrivialFactors {
        /// The base `a`.
        base: u64,
        /// The even candidates tried.
        orders: Vec<u64>,
    },
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrivialMeasurement { base } => write!(f, "a = {base}: measured y = 0"),
            Self::NoEvenOrder { base, candidates } => {
                write!(f, "a = {base}: no even order among {candidates:?}")
            }
            Self::TrivialFactors { base, orders } => {
                write!(f, "a = {base}: orders {orders:?} only gave trivial gcds")
            }
        }
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorResult {
    /// A nontrivial factor.
    Found(Factor),
    /// Nothing usable; try again with a new base.
    Retry(RetryReason),
}

impl FactorResult {
    /// The factor, if one was found.
    pub fn factor(&self) -> Option<&Factor> {
        match self {
            Self::Found(f) => Some(f),
            Self::Retry(_) => None,
        }
    }

    /// True for [`FactorResult::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Shor's algorithm with a fixed configuration.
///
/// ```
/// use qshor_core::{Shor, ShorConfig};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let shor = Shor::new(ShorConfig::default());
/// let mut rng = StdRng::seed_from_u64(7);
/// let d = shor.factor(15, &mut rng).unwrap();
/// assert!(d == 3 || d == 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Shor {
    config: ShorConfig,
}

impl Shor {
    /// Driver with `config`.
    pub fn new(config: ShorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ShorConfig {
        &self.config
    }

    /// One attempt; no retries.
    ///
    /// Primes are rejected with [`ShorError::PrimeInput`] rather than
    /// retried, since they have no nontrivial divisor; `n < 2` gives
    /// [`ShorError::InputTooSmall`].
    pub fn factor_once<R: Rng + ?Sized>(&self, n: u64, rng: &mut R) -> ShorResult<FactorResult> {
        validate(n)?;
        self.attempt(n, rng, self.deadline())
    }

    /// Retry attempts until a factor is found or `max_attempts` run out.
    pub fn factor<R: Rng + ?Sized>(&self, n: u64, rng: &mut R) -> ShorResult<u64> {
        Ok(self.find_factor(n, rng)?.value)
    }

    /// Like [`Shor::factor`], but keeps how the factor was found.
    pub fn find_factor<R: Rng + ?Sized>(&self, n: u64, rng: &mut R) -> ShorResult<Factor> {
        validate(n)?;
        let attempts = self.config.max_attempts;
        if attempts == 0 {
            return Err(ShorError::NoAttempts);
        }
        let deadline = self.deadline();
        for attempt in 1..=attempts {
            match self.attempt(n, rng, deadline)? {
                FactorResult::Found(factor) => {
                    info!(n, attempt, factor = factor.value, source = %factor.source, "found factor");
                    return Ok(factor);
                }
                FactorResult::Retry(reason) => {
                    debug!(n, attempt, %reason, "attempt failed, retrying");
                }
            }
        }
        warn!(n, attempts, "no factor found");
        Err(ShorError::ExhaustedRetries {
            modulus: n,
            attempts,
        })
    }

    /// Split `n` into its prime factors, ascending with multiplicity.
    pub fn full_factorization<R: Rng + ?Sized>(&self, n: u64, rng: &mut R) -> ShorResult<Vec<u64>> {
        if n < 2 {
            return Err(ShorError::InputTooSmall(n));
        }
        let mut primes = Vec::new();
        let mut pending = vec![n];
        while let Some(m) = pending.pop() {
            if is_prime(m) {
                primes.push(m);
                continue;
            }
            let factor = self.find_factor(m, rng)?;
            debug!(m, d = factor.value, cofactor = factor.cofactor, "split");
            pending.push(factor.value);
            pending.push(factor.cofactor);
        }
        primes.sort_unstable();
        Ok(primes)
    }

    /// Run the attempts on the rayon pool.
    ///
    /// Attempt `i` draws from `StdRng::seed_from_u64(seed + i)`; the success
    /// with the lowest `i` wins, so the answer depends only on the seed.
    pub fn factor_parallel(&self, n: u64, seed: u64) -> ShorResult<u64> {
        Ok(self.find_factor_parallel(n, seed)?.value)
    }

    /// Like [`Shor::factor_parallel`], but keeps how the factor was found.
    pub fn find_factor_parallel(&self, n: u64, seed: u64) -> ShorResult<Factor> {
        validate(n)?;
        let attempts = self.config.max_attempts;
        if attempts == 0 {
            return Err(ShorError::NoAttempts);
        }
        let deadline = self.deadline();
        let first = (0..attempts).into_par_iter().find_map_first(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            match self.attempt(n, &mut rng, deadline) {
                Ok(FactorResult::Found(factor)) => Some(Ok(factor)),
                Ok(FactorResult::Retry(reason)) => {
                    debug!(n, attempt = i, %reason, "parallel attempt failed");
                    None
                }
                Err(e) => Some(Err(e)),
            }
        });
        match first {
            Some(result) => result,
            None => {
                warn!(n, attempts, "no factor found");
                Err(ShorError::ExhaustedRetries {
                    modulus: n,
                    attempts,
                })
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.deadline.map(|budget| Instant::now() + budget)
    }

    fn attempt<R: Rng + ?Sized>(
        &self,
        n: u64,
        rng: &mut R,
        deadline: Option<Instant>,
    ) -> ShorResult<FactorResult> {
        if n % 2 == 0 {
            return Ok(FactorResult::Found(Factor::new(n, 2, FactorSource::EvenInput)));
        }
        if let Some(power) = is_perfect_power(n) {
            return Ok(FactorResult::Found(Factor::new(
                n,
                power.base,
                FactorSource::PerfectPower {
                    exponent: power.exponent,
                },
            )));
        }

        let a = rng.gen_range(2..n);
        let d = gcd(a, n)?;
        if d > 1 {
            return Ok(FactorResult::Found(Factor::new(
                n,
                d,
                FactorSource::SharedBase { base: a },
            )));
        }

        let mut finder = OrderFinder::from_config(&self.config);
        if let Some(deadline) = deadline {
            finder = finder.with_deadline(deadline);
        }
        let outcome = finder.find_order(a, n, rng)?;
        if outcome.value() == 0 {
            return Ok(FactorResult::Retry(RetryReason::TrivialMeasurement { base: a }));
        }

        let estimate = OrderEstimate::from_outcome(&outcome, n)?;
        debug!(a, measured = outcome.value(), candidates = ?estimate.candidates(), "order candidates");
        let even: Vec<u64> = estimate
            .candidates()
            .iter()
            .copied()
            .filter(|r| r % 2 == 0)
            .collect();
        if even.is_empty() {
            return Ok(FactorResult::Retry(RetryReason::NoEvenOrder {
                base: a,
                candidates: estimate.candidates().to_vec(),
            }));
        }

        for &r in &even {
            let x = mod_pow(a, r / 2, n)?;
            let minus = x.checked_sub(1).unwrap_or(n - 1);
            let plus = (x + 1) % n;
            for g in [gcd(minus, n)?, gcd(plus, n)?] {
                if g > 1 && g < n {
                    return Ok(FactorResult::Found(Factor::new(
                        n,
                        g,
                        FactorSource::OrderFinding {
                            base: a,
                            order: r,
                            measured: outcome.value(),
                        },
                    )));
                }
            }
        }
        Ok(FactorResult::Retry(RetryReason::TrivialFactors {
            base: a,
            orders: even,
        }))
    }
}

fn validate(n: u64) -> ShorResult<()> {
    if n < 2 {
        return Err(ShorError::InputTooSmall(n));
    }
    if is_prime(n) {
        return Err(ShorError::PrimeInput(n));
    }
    Ok(())
}

/// One attempt with the default configuration.
///
/// Like [`Shor::factor_once`], a prime `n` is an error
/// ([`ShorError::PrimeInput`]), not a retry.
pub fn factor_once<R: Rng + ?Sized>(n: u64, rng: &mut R) -> ShorResult<FactorResult> {
    Shor::default().factor_once(n, rng)
}

/// A nontrivial factor of `n` within `max_attempts` attempts.
pub fn factor<R: Rng + ?Sized>(n: u64, rng: &mut R, max_attempts: usize) -> ShorResult<u64> {
    Shor::new(ShorConfig::default().with_max_attempts(max_attempts)).factor(n, rng)
}

/// The prime factorization of `n`, ascending with multiplicity.
pub fn full_factorization<R: Rng + ?Sized>(
    n: u64,
    rng: &mut R,
    max_attempts: usize,
) -> ShorResult<Vec<u64>> {
    Shor::new(ShorConfig::default().with_max_attempts(max_attempts)).full_factorization(n, rng)
}

/// [`factor`] with the attempts spread over the rayon pool.
pub fn factor_parallel(n: u64, seed: u64, max_attempts: usize) -> ShorResult<u64> {
    Shor::new(ShorConfig::default().with_max_attempts(max_attempts)).factor_parallel(n, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_input_short_circuits() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = factor_once(10, &mut rng).unwrap();
        assert_eq!(
            result.factor(),
            Some(&Factor {
                value: 2,
                cofactor: 5,
                source: FactorSource::EvenInput
            })
        );
    }

    #[test]
    fn test_perfect_power_short_circuits() {
        let mut rng = StdRng::seed_from_u64(0);
        let factor = *factor_once(27, &mut rng).unwrap().factor().unwrap();
        assert_eq!(factor.value, 3);
        assert_eq!(factor.cofactor, 9);
        assert_eq!(factor.source, FactorSource::PerfectPower { exponent: 3 });
    }

    #[test]
    fn test_validation() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(factor_once(1, &mut rng), Err(ShorError::InputTooSmall(1))));
        assert!(matches!(factor_once(2, &mut rng), Err(ShorError::PrimeInput(2))));
        assert!(matches!(factor(13, &mut rng, 5), Err(ShorError::PrimeInput(13))));
        assert!(matches!(factor(15, &mut rng, 0), Err(ShorError::NoAttempts)));
        assert!(matches!(
            full_factorization(0, &mut rng, 5),
            Err(ShorError::InputTooSmall(0))
        ));
    }

    #[test]
    fn test_found_factor_divides() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            if let FactorResult::Found(f) = factor_once(21, &mut rng).unwrap() {
                assert!(f.value > 1 && f.value < 21);
                assert_eq!(f.value * f.cofactor, 21);
            }
        }
    }

    #[test]
    fn test_result_serde_shape() {
        let result = FactorResult::Found(Factor::new(15, 3, FactorSource::SharedBase { base: 6 }));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["Found"]["source"]["kind"], "shared_base");
        assert_eq!(json["Found"]["cofactor"], 5);
    }
}
