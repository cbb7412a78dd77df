//! Error types for the simulator crate.

use thiserror::Error;

/// Coarse classification shared by every qshor error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller asked for something malformed; never retried.
    InvalidInput,
    /// The simulator broke one of its own invariants. Indicates a bug.
    InvariantViolation,
    /// Every factoring attempt ended in a retry.
    ExhaustedRetries,
    /// A configured deadline expired between simulation stages.
    DeadlineExceeded,
}

/// Errors produced by the statevector simulator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Register width is zero or above the supported maximum.
    #[error("Invalid qubit count {got}: must be between 1 and {max}")]
    InvalidQubitCount {
        /// Requested number of qubits.
        got: usize,
        /// Largest supported register.
        max: usize,
    },

    /// Initial basis value does not fit in the register.
    #[error("Initial value {value} does not fit in {num_qubits} qubits")]
    InitialValueOutOfRange {
        /// Requested basis state.
        value: usize,
        /// Register width.
        num_qubits: usize,
    },

    /// Amplitude vector has the wrong length or is not normalized.
    #[error("Invalid amplitude vector: {0}")]
    InvalidAmplitudes(String),

    /// A gate or measurement references a qubit outside the register.
    #[error("Qubit {qubit} out of range for a {num_qubits}-qubit register")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: usize,
        /// Register width.
        num_qubits: usize,
    },

    /// The same qubit appears twice among targets and controls.
    #[error("Qubit {0} used more than once in a single operation")]
    DuplicateQubit(usize),

    /// Operator width and number of target qubits disagree.
    #[error("Operator acts on {expected} qubits, got {got} targets")]
    ArityMismatch {
        /// Qubits the operator acts on.
        expected: usize,
        /// Targets supplied by the caller.
        got: usize,
    },

    /// A 2×2 matrix failed the `U†U = I` check.
    #[error("Matrix is not unitary (deviation {deviation:.3e})")]
    NotUnitary {
        /// Largest entry of `|U†U - I|`.
        deviation: f64,
    },

    /// A permutation table is not a bijection over `2^k` entries.
    #[error("Permutation table is not a bijection: {0}")]
    NotBijective(String),

    /// Total probability drifted away from 1.
    #[error("Probability not conserved after {operation}: norm² = {norm_sqr}\n{dump}")]
    InvariantViolation {
        /// Operation that broke the invariant.
        operation: &'static str,
        /// Observed `Σ|amp|²`.
        norm_sqr: f64,
        /// Nonzero amplitudes at the time of failure.
        dump: String,
    },

    /// A measurement produced an impossible outcome.
    #[error("Measurement outcome {outcome} out of range for {num_bits} measured qubits")]
    OutcomeOutOfRange {
        /// The sampled outcome.
        outcome: usize,
        /// Number of qubits measured.
        num_bits: usize,
    },
}

impl SimError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvariantViolation { .. } | Self::OutcomeOutOfRange { .. } => {
                ErrorKind::InvariantViolation
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;
