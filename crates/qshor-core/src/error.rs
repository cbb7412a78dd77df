//! Error types for the factoring core.

use qshor_sim::{ErrorKind, SimError};
use thiserror::Error;

/// Errors produced by number theory, order finding and the Shor driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShorError {
    /// Inputs below 2 have no factorization to search for.
    #[error("N must be at least 2, got {0}")]
    InputTooSmall(u64),

    /// A prime has no nontrivial divisor.
    #[error("{0} is prime and has no nontrivial factor")]
    PrimeInput(u64),

    /// `gcd(0, 0)` is undefined.
    #[error("gcd(0, 0) is undefined")]
    ZeroGcd,

    /// Modular arithmetic with modulus 0.
    #[error("modulus must be positive")]
    ZeroModulus,

    /// Continued fraction of `x/0`.
    #[error("continued fraction denominator must be positive")]
    ZeroDenominator,

    /// The multiplier `x -> a·x mod N` is not a bijection.
    #[error("{base} is not invertible modulo {modulus} (gcd = {gcd})")]
    NonInvertibleBase {
        /// Multiplier.
        base: u64,
        /// Modulus.
        modulus: u64,
        /// `gcd(base, modulus)`.
        gcd: u64,
    },

    /// The modulus does not fit in the target register.
    #[error("modulus {modulus} does not fit in {num_qubits} qubits")]
    ModulusExceedsRegister {
        /// Modulus.
        modulus: u64,
        /// Target register width.
        num_qubits: usize,
    },

    /// Even the single-control circuit needs more qubits than the simulator allows.
    #[error("order finding for N = {modulus} needs {required} qubits, limit is {limit}")]
    RegisterTooLarge {
        /// Modulus.
        modulus: u64,
        /// Qubits the circuit needs.
        required: usize,
        /// Configured or hard limit.
        limit: usize,
    },

    /// `max_attempts` was zero.
    #[error("at least one attempt is required")]
    NoAttempts,

    /// Every attempt ended in a retry.
    #[error("no factor of {modulus} found after {attempts} attempts")]
    ExhaustedRetries {
        /// The number being factored.
        modulus: u64,
        /// Attempts made.
        attempts: usize,
    },

    /// The configured deadline expired between stages.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded {
        /// Stage that noticed the expiry.
        stage: &'static str,
    },

    /// Simulator error.
    #[error("simulator error: {0}")]
    Sim(#[from] SimError),
}

impl ShorError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sim(e) => e.kind(),
            Self::ExhaustedRetries { .. } => ErrorKind::ExhaustedRetries,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            _ => ErrorKind::InvalidInput,
        }
    }

    /// Whether calling again with fresh randomness can succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ExhaustedRetries
    }
}

/// Result type for factoring operations.
pub type ShorResult<T> = Result<T, ShorError>;
