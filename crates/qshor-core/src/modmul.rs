//! Modular multiplication as a basis permutation.
//!
//! `M_a |x⟩ = |a·x mod N⟩` for `x < N` and `|x⟩` for `N <= x < 2^n`. With
//! `gcd(a, N) == 1` this is a bijection, so it is a valid unitary on the
//! target register.

use qshor_sim::{MAX_QUBITS, Operator, Permutation};

use crate::error::{ShorError, ShorResult};
use crate::number_theory::{gcd, mod_inverse, mul_mod};

/// The permutation `x -> base·x mod modulus` on an `num_qubits`-qubit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModularMultiplier {
    base: u64,
    modulus: u64,
    num_qubits: usize,
}

impl ModularMultiplier {
    /// Validate and build the multiplier.
    ///
    /// Fails if `modulus < 2`, `gcd(base, modulus) != 1`, or the modulus
    /// does not fit in `num_qubits` qubits.
    pub fn new(base: u64, modulus: u64, num_qubits: usize) -> ShorResult<Self> {
        if modulus < 2 {
            return Err(ShorError::InputTooSmall(modulus));
        }
        let base = base % modulus;
        let g = gcd(base, modulus)?;
        if g != 1 {
            return Err(ShorError::NonInvertibleBase {
                base,
                modulus,
                gcd: g,
            });
        }
        if num_qubits > MAX_QUBITS {
            return Err(ShorError::RegisterTooLarge {
                modulus,
                required: num_qubits,
                limit: MAX_QUBITS,
            });
        }
        if num_qubits == 0 || modulus > 1u64 << num_qubits {
            return Err(ShorError::ModulusExceedsRegister {
                modulus,
                num_qubits,
            });
        }
        Ok(Self {
            base,
            modulus,
            num_qubits,
        })
    }

    /// The multiplier, reduced modulo `modulus`.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The modulus `N`.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Width of the target register.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Image of basis state `x`.
    pub fn apply(&self, x: u64) -> u64 {
        if x < self.modulus {
            mul_mod(self.base, x, self.modulus)
        } else {
            x
        }
    }

    /// The multiplier for `base^(2^j) mod modulus`.
    ///
    /// Computed with `j` modular squarings of the base; the operator itself
    /// is never composed with itself.
    #[must_use]
    pub fn squared_power(&self, j: u32) -> Self {
        let mut base = self.base;
        for _ in 0..j {
            base = mul_mod(base, base, self.modulus);
        }
        Self { base, ..*self }
    }

    /// Multiplication by `base⁻¹ mod modulus`.
    pub fn inverse(&self) -> ShorResult<Self> {
        let inv = mod_inverse(self.base, self.modulus).ok_or(ShorError::NonInvertibleBase {
            base: self.base,
            modulus: self.modulus,
            gcd: gcd(self.base, self.modulus)?,
        })?;
        Ok(Self { base: inv, ..*self })
    }

    /// Tabulate the permutation over all `2^num_qubits` basis states.
    pub fn to_permutation(&self) -> ShorResult<Permutation> {
        Ok(Permutation::from_fn(self.num_qubits, |x| self.apply(x as u64) as usize)?)
    }

    /// The permutation as a gate operator.
    pub fn to_operator(&self) -> ShorResult<Operator> {
        Ok(self.to_permutation()?.into())
    }
}

/// Build `M_{a_power}` on a `num_qubits`-qubit register.
pub fn build_mod_mult_operator(a_power: u64, modulus: u64, num_qubits: usize) -> ShorResult<Operator> {
    ModularMultiplier::new(a_power, modulus, num_qubits)?.to_operator()
}
