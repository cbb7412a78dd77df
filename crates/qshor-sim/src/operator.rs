//! Tagged gate operators.
//!
//! Every gate the simulator needs is either a 2×2 unitary on one qubit or a
//! permutation of the basis states of a small block of qubits. Controlled
//! variants are not separate operators: the register applies any operator
//! under an arbitrary set of control qubits.

use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::{SimError, SimResult};

/// A 2×2 complex matrix, row-major.
pub type Matrix2 = [[Complex64; 2]; 2];

/// Largest deviation from `U†U = I` accepted for a single-qubit matrix.
const UNITARY_TOLERANCE: f64 = 1e-10;

/// A unitary operator on one or more target qubits.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// A single-qubit unitary matrix.
    Single(Matrix2),
    /// A basis-state permutation on `k` qubits.
    Permutation(Permutation),
}

impl Operator {
    /// Build a single-qubit operator, checking unitarity.
    pub fn single(matrix: Matrix2) -> SimResult<Self> {
        let deviation = unitary_deviation(&matrix);
        if deviation > UNITARY_TOLERANCE {
            return Err(SimError::NotUnitary { deviation });
        }
        Ok(Self::Single(matrix))
    }

    /// Build a permutation operator from a lookup table.
    pub fn permutation(table: Vec<usize>) -> SimResult<Self> {
        Ok(Self::Permutation(Permutation::new(table)?))
    }

    /// Hadamard gate.
    pub fn hadamard() -> Self {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        Self::Single([[h, h], [h, -h]])
    }

    /// Pauli-X (NOT) gate.
    pub fn pauli_x() -> Self {
        Self::Permutation(Permutation {
            table: vec![1, 0],
            num_qubits: 1,
        })
    }

    /// Phase gate `diag(1, e^{iθ})`.
    pub fn phase(theta: f64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        Self::Single([[one, zero], [zero, Complex64::from_polar(1.0, theta)]])
    }

    /// `R_k = diag(1, e^{2πi/2^k})`, the QFT rotation.
    pub fn rk(k: u32) -> Self {
        Self::phase(std::f64::consts::TAU / f64::from(k).exp2())
    }

    /// Two-qubit SWAP.
    pub fn swap() -> Self {
        Self::Permutation(Permutation {
            table: vec![0, 2, 1, 3],
            num_qubits: 2,
        })
    }

    /// Number of target qubits this operator acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Permutation(p) => p.num_qubits(),
        }
    }

    /// The inverse operator (conjugate transpose / inverse permutation).
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::Single(m) => Self::Single([
                [m[0][0].conj(), m[1][0].conj()],
                [m[0][1].conj(), m[1][1].conj()],
            ]),
            Self::Permutation(p) => Self::Permutation(p.inverse()),
        }
    }
}

impl From<Permutation> for Operator {
    fn from(p: Permutation) -> Self {
        Self::Permutation(p)
    }
}

/// Largest entry of `|U†U - I|`.
fn unitary_deviation(m: &Matrix2) -> f64 {
    let mut worst: f64 = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let dot = m[0][i].conj() * m[0][j] + m[1][i].conj() * m[1][j];
            let expected = if i == j { 1.0 } else { 0.0 };
            worst = worst.max((dot - Complex64::new(expected, 0.0)).norm());
        }
    }
    worst
}

/// A bijection on `[0, 2^k)`.
///
/// Entry `x` of the table is the image of sub-state `x`, where bit `i` of
/// `x` is the value of the `i`-th target qubit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    table: Vec<usize>,
    num_qubits: usize,
}

impl Permutation {
    /// Create a permutation from its image table.
    ///
    /// The table length must be a power of two (at least 2) and every index
    /// must appear exactly once.
    pub fn new(table: Vec<usize>) -> SimResult<Self> {
        let len = table.len();
        if len < 2 || !len.is_power_of_two() {
            return Err(SimError::NotBijective(format!(
                "table length {len} is not a power of two >= 2"
            )));
        }
        let mut seen = vec![false; len];
        for (x, &y) in table.iter().enumerate() {
            if y >= len {
                return Err(SimError::NotBijective(format!(
                    "image {y} of {x} outside [0, {len})"
                )));
            }
            if std::mem::replace(&mut seen[y], true) {
                return Err(SimError::NotBijective(format!("image {y} repeated")));
            }
        }
        Ok(Self {
            num_qubits: len.trailing_zeros() as usize,
            table,
        })
    }

    /// Tabulate `f` over `[0, 2^num_qubits)`.
    pub fn from_fn(num_qubits: usize, f: impl Fn(usize) -> usize) -> SimResult<Self> {
        Self::new((0..1usize << num_qubits).map(f).collect())
    }

    /// Identity on `num_qubits` qubits.
    pub fn identity(num_qubits: usize) -> Self {
        Self {
            table: (0..1usize << num_qubits).collect(),
            num_qubits,
        }
    }

    /// Number of qubits the permutation acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of sub-states (`2^num_qubits`).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; a permutation covers at least one qubit.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Image of `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= self.len()`.
    pub fn apply(&self, x: usize) -> usize {
        self.table[x]
    }

    /// The image table.
    pub fn table(&self) -> &[usize] {
        &self.table
    }

    /// Inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut table = vec![0; self.table.len()];
        for (x, &y) in self.table.iter().enumerate() {
            table[y] = x;
        }
        Self {
            table,
            num_qubits: self.num_qubits,
        }
    }

    /// `other ∘ self`: apply `self`, then `other`.
    ///
    /// Returns `None` when the widths differ.
    pub fn then(&self, other: &Self) -> Option<Self> {
        if self.num_qubits != other.num_qubits {
            return None;
        }
        Some(Self {
            table: self.table.iter().map(|&y| other.table[y]).collect(),
            num_qubits: self.num_qubits,
        })
    }

    /// The cycle containing `start`, beginning with `start`.
    ///
    /// # Panics
    ///
    /// Panics if `start >= self.len()`.
    pub fn orbit(&self, start: usize) -> Vec<usize> {
        let mut cycle = vec![start];
        let mut x = self.table[start];
        while x != start {
            cycle.push(x);
            x = self.table[x];
        }
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_gates_are_unitary() {
        for op in [Operator::hadamard(), Operator::phase(0.3), Operator::rk(3)] {
            let Operator::Single(m) = op else {
                panic!("expected single-qubit matrix");
            };
            assert!(unitary_deviation(&m) < 1e-12);
        }
    }

    #[test]
    fn test_rejects_non_unitary() {
        let one = Complex64::new(1.0, 0.0);
        let err = Operator::single([[one, one], [one, one]]).unwrap_err();
        assert!(matches!(err, SimError::NotUnitary { .. }));
    }

    #[test]
    fn test_permutation_validation() {
        assert!(Permutation::new(vec![0, 1, 2]).is_err());
        assert!(Permutation::new(vec![0]).is_err());
        assert!(Permutation::new(vec![0, 0]).is_err());
        assert!(Permutation::new(vec![0, 4, 1, 2]).is_err());
        assert_eq!(Permutation::new(vec![3, 2, 1, 0]).unwrap().num_qubits(), 2);
    }

    #[test]
    fn test_permutation_inverse() {
        let p = Permutation::new(vec![2, 0, 3, 1]).unwrap();
        let inv = p.inverse();
        for x in 0..4 {
            assert_eq!(p.apply(inv.apply(x)), x);
            assert_eq!(inv.apply(p.apply(x)), x);
        }
        assert_eq!(p.then(&inv).unwrap(), Permutation::identity(2));
    }

    #[test]
    fn test_orbit() {
        let p = Permutation::new(vec![1, 2, 0, 3]).unwrap();
        assert_eq!(p.orbit(0), vec![0, 1, 2]);
        assert_eq!(p.orbit(3), vec![3]);
    }

    #[test]
    #[should_panic]
    fn test_orbit_out_of_range_panics() {
        let p = Permutation::identity(2);
        let _ = p.orbit(4);
    }

    #[test]
    fn test_single_inverse_is_adjoint() {
        let op = Operator::phase(0.7);
        let Operator::Single(inv) = op.inverse() else {
            panic!("expected single-qubit matrix");
        };
        assert!((inv[1][1] - Complex64::from_polar(1.0, -0.7)).norm() < 1e-12);
    }
}
