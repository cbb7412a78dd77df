//! `qshor-sim`: exact statevector simulation for the qshor factoring stack.
//!
//! A [`QuantumRegister`] stores all `2^n` complex amplitudes of an `n`-qubit
//! state. Gates are [`Operator`]s (a 2×2 unitary or a basis permutation)
//! applied to any set of target qubits, optionally under control qubits.
//! Measurement samples from an injected [`rand::Rng`] and collapses the state.
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//! | 30 | ~16 GB (hard limit) |
//!
//! # Example
//!
//! ```rust
//! use qshor_sim::{QuantumRegister, qft, inverse_qft};
//! use rand::SeedableRng;
//!
//! let mut reg = QuantumRegister::new(3, 5).unwrap();
//! qft(&mut reg, &[0, 1, 2]).unwrap();
//! inverse_qft(&mut reg, &[0, 1, 2]).unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! assert_eq!(reg.measure(&[0, 1, 2], &mut rng).unwrap(), 5);
//! ```

pub mod error;
pub mod operator;
pub mod qft;
pub mod register;

pub use error::{ErrorKind, SimError, SimResult};
pub use operator::{Matrix2, Operator, Permutation};
pub use qft::{inverse_qft, qft};
pub use register::{MAX_QUBITS, NORM_TOLERANCE, QuantumRegister};
