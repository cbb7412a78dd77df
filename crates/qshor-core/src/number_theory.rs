//! Classical number theory for Shor's algorithm.
//!
//! Everything here works on `u64`; products go through `u128` so no
//! intermediate overflows for any modulus below `2^64`.

use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

use crate::error::{ShorError, ShorResult};

/// Greatest common divisor by Euclid's algorithm.
///
/// `gcd(x, 0) == x`; `gcd(0, 0)` is an error.
pub fn gcd(x: u64, y: u64) -> ShorResult<u64> {
    if x == 0 && y == 0 {
        return Err(ShorError::ZeroGcd);
    }
    let (mut a, mut b) = (x, y);
    while b != 0 {
        std::mem::swap(&mut a, &mut b);
        b %= a;
    }
    Ok(a)
}

/// `(a · b) mod m` without overflow.
pub(crate) fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
}

/// `base^exponent mod modulus` by repeated squaring.
pub fn mod_pow(base: u64, exponent: u64, modulus: u64) -> ShorResult<u64> {
    if modulus == 0 {
        return Err(ShorError::ZeroModulus);
    }
    if modulus == 1 {
        return Ok(0);
    }
    let mut result = 1u64;
    let mut base = base % modulus;
    let mut exp = exponent;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    Ok(result)
}

/// Inverse of `a` modulo `n`, if `gcd(a, n) == 1`.
pub fn mod_inverse(a: u64, n: u64) -> Option<u64> {
    if n == 0 {
        return None;
    }
    let (mut old_r, mut r) = (i128::from(a % n), i128::from(n));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(i128::from(n)) as u64)
}

/// Smallest `r >= 1` with `a^r ≡ 1 (mod n)`, found by brute force.
///
/// Returns `None` when `n < 2` or `gcd(a, n) != 1`. Costs `O(r)`
/// multiplications; meant for checking quantum estimates on small inputs.
pub fn multiplicative_order(a: u64, n: u64) -> Option<u64> {
    if n < 2 || gcd(a, n).ok()? != 1 {
        return None;
    }
    let a = a % n;
    let mut x = a;
    let mut r = 1;
    while x != 1 {
        x = mul_mod(x, a, n);
        r += 1;
    }
    Some(r)
}

/// `ceil(log2(n))`; 0 for `n <= 1`.
pub fn ceil_log2(n: u64) -> u32 {
    if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() }
}

/// Floor of the `k`-th root of `n`.
///
/// # Panics
///
/// Panics if `k == 0`.
pub fn integer_root(n: u64, k: u32) -> u64 {
    assert!(k > 0, "zeroth root is undefined");
    if k == 1 || n < 2 {
        return n;
    }
    let fits = |r: u64| r.checked_pow(k).is_some_and(|v| v <= n);
    // The float estimate is within a few units; correct it exactly.
    let mut r = (n as f64).powf(1.0 / f64::from(k)) as u64;
    while r > 0 && !fits(r) {
        r -= 1;
    }
    while fits(r + 1) {
        r += 1;
    }
    r
}

/// `base^exponent` with `base >= 2`, `exponent >= 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerfectPower {
    /// The root `p`.
    pub base: u64,
    /// The exponent `k`.
    pub exponent: u32,
}

/// Detect `n = p^k` with `p >= 2`, `k >= 2`.
///
/// Exponents are scanned upward from 2 to `floor(log2 n)`; the first exact
/// root wins, so `64` reports `8^2`. `0`, `1`, primes and smooth
/// non-powers such as `12` return `None`.
pub fn is_perfect_power(n: u64) -> Option<PerfectPower> {
    if n < 4 {
        return None;
    }
    let max_exponent = 63 - n.leading_zeros();
    (2..=max_exponent).find_map(|k| {
        let root = integer_root(n, k);
        (root >= 2 && root.checked_pow(k) == Some(n)).then_some(PerfectPower {
            base: root,
            exponent: k,
        })
    })
}

/// Witnesses that make Miller-Rabin deterministic for every `u64`.
const MR_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic primality test for `u64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in MR_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in MR_BASES {
        // n > 37 here, so the modulus is valid.
        let mut x = mod_pow(a, d, n).unwrap_or(0);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

// =============================================================================
// Continued fractions
// =============================================================================

/// A convergent `p/q` of a continued fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Convergent {
    /// `p`.
    pub numerator: u64,
    /// `q`.
    pub denominator: u64,
}

impl From<(u64, u64)> for Convergent {
    fn from((numerator, denominator): (u64, u64)) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// The continued-fraction expansion of `numerator/denominator`, with
/// convergents truncated at `max_denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuedFraction {
    numerator: u64,
    denominator: u64,
    max_denominator: u64,
}

impl ContinuedFraction {
    /// Expansion of `numerator/denominator`.
    pub fn new(numerator: u64, denominator: u64, max_denominator: u64) -> ShorResult<Self> {
        if denominator == 0 {
            return Err(ShorError::ZeroDenominator);
        }
        Ok(Self {
            numerator,
            denominator,
            max_denominator,
        })
    }

    /// A fresh pass over the convergents; call again to restart.
    pub fn convergents(&self) -> Convergents {
        Convergents {
            num: self.numerator,
            den: self.denominator,
            p_prev: 0,
            p: 1,
            q_prev: 1,
            q: 0,
            max_denominator: self.max_denominator,
            done: false,
        }
    }

    /// Partial quotients `[a0; a1, a2, …]` of the full expansion.
    pub fn partial_quotients(&self) -> Vec<u64> {
        let (mut num, mut den) = (self.numerator, self.denominator);
        let mut quotients = Vec::new();
        while den != 0 {
            quotients.push(num / den);
            (num, den) = (den, num % den);
        }
        quotients
    }
}

/// Lazy convergent sequence; see [`continued_fraction_convergents`].
#[derive(Debug, Clone)]
pub struct Convergents {
    num: u64,
    den: u64,
    p_prev: u64,
    p: u64,
    q_prev: u64,
    q: u64,
    max_denominator: u64,
    done: bool,
}

impl Iterator for Convergents {
    type Item = Convergent;

    fn next(&mut self) -> Option<Convergent> {
        if self.done || self.den == 0 {
            return None;
        }
        let a = self.num / self.den;
        (self.num, self.den) = (self.den, self.num % self.den);

        // Convergents of a rational are bounded by its terms, so neither
        // product overflows.
        let p = a * self.p + self.p_prev;
        let q = a * self.q + self.q_prev;
        if q > self.max_denominator {
            self.done = true;
            return None;
        }
        (self.p_prev, self.p) = (self.p, p);
        (self.q_prev, self.q) = (self.q, q);
        Some(Convergent {
            numerator: p,
            denominator: q,
        })
    }
}

impl FusedIterator for Convergents {}

/// Convergents `(p_i, q_i)` of `numerator/denominator`, stopping before the
/// first `q_i > max_denominator`.
pub fn continued_fraction_convergents(
    numerator: u64,
    denominator: u64,
    max_denominator: u64,
) -> ShorResult<Convergents> {
    Ok(ContinuedFraction::new(numerator, denominator, max_denominator)?.convergents())
}
