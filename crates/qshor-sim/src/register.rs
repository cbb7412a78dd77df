//! Statevector register.
//!
//! The register is a flat array of `2^n` complex amplitudes indexed by basis
//! state. Qubit `q` is bit `q` of the index, so qubit 0 is the least
//! significant bit of the encoded integer.

use num_complex::Complex64;
use rand::Rng;
use std::fmt::Write as _;
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::operator::{Matrix2, Operator, Permutation};

/// Largest register the simulator will allocate (16 GiB of amplitudes).
pub const MAX_QUBITS: usize = 30;

/// Tolerance on `Σ|amp|² = 1`.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// An exact quantum register over `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumRegister {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl QuantumRegister {
    /// Create a register in the basis state `|initial_value⟩`.
    pub fn new(num_qubits: usize, initial_value: usize) -> SimResult<Self> {
        if num_qubits == 0 || num_qubits > MAX_QUBITS {
            return Err(SimError::InvalidQubitCount {
                got: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let size = 1usize << num_qubits;
        if initial_value >= size {
            return Err(SimError::InitialValueOutOfRange {
                value: initial_value,
                num_qubits,
            });
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[initial_value] = Complex64::new(1.0, 0.0);
        trace!(num_qubits, initial_value, "allocated register");
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Create a register from an explicit, normalized amplitude vector.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if len < 2 || !len.is_power_of_two() {
            return Err(SimError::InvalidAmplitudes(format!(
                "length {len} is not a power of two >= 2"
            )));
        }
        let num_qubits = len.trailing_zeros() as usize;
        if num_qubits > MAX_QUBITS {
            return Err(SimError::InvalidQubitCount {
                got: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let norm_sqr: f64 = amplitudes.iter().map(Complex64::norm_sqr).sum();
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
            return Err(SimError::InvalidAmplitudes(format!(
                "norm² = {norm_sqr}, expected 1"
            )));
        }
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of basis states (`2^num_qubits`).
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    /// All amplitudes, indexed by basis state.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of one basis state.
    pub fn amplitude(&self, basis: usize) -> Option<Complex64> {
        self.amplitudes.get(basis).copied()
    }

    /// Probability of observing `basis` when measuring every qubit.
    pub fn probability(&self, basis: usize) -> f64 {
        self.amplitudes.get(basis).map_or(0.0, Complex64::norm_sqr)
    }

    /// `Σ|amp|²`; 1 for a valid state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Whether every amplitude is within `tolerance` of `other`'s.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.num_qubits == other.num_qubits
            && self
                .amplitudes
                .iter()
                .zip(&other.amplitudes)
                .all(|(a, b)| (a - b).norm() <= tolerance)
    }

    /// Apply `operator` to `targets`; identity on every other qubit.
    pub fn apply(&mut self, operator: &Operator, targets: &[usize]) -> SimResult<()> {
        self.apply_controlled(operator, &[], targets)
    }

    /// Apply `operator` to `targets` on the subspace where every qubit in
    /// `controls` is 1; identity elsewhere.
    pub fn apply_controlled(
        &mut self,
        operator: &Operator,
        controls: &[usize],
        targets: &[usize],
    ) -> SimResult<()> {
        self.validate(controls, targets, operator.num_qubits())?;
        let control_mask = mask_of(controls);
        match operator {
            Operator::Single(m) => self.apply_single(m, control_mask, targets[0]),
            Operator::Permutation(p) => self.apply_permutation(p, control_mask, targets),
        }
        self.check_normalized("apply")
    }

    // =========================================================================
    // Convenience gates
    // =========================================================================

    /// Hadamard on `qubit`.
    pub fn h(&mut self, qubit: usize) -> SimResult<()> {
        self.apply(&Operator::hadamard(), &[qubit])
    }

    /// Pauli-X on `qubit`.
    pub fn x(&mut self, qubit: usize) -> SimResult<()> {
        self.apply(&Operator::pauli_x(), &[qubit])
    }

    /// Phase rotation `diag(1, e^{iθ})` on `qubit`.
    pub fn phase(&mut self, qubit: usize, theta: f64) -> SimResult<()> {
        self.apply(&Operator::phase(theta), &[qubit])
    }

    /// Controlled phase rotation.
    pub fn controlled_phase(&mut self, control: usize, target: usize, theta: f64) -> SimResult<()> {
        self.apply_controlled(&Operator::phase(theta), &[control], &[target])
    }

    /// Exchange two qubits.
    pub fn swap(&mut self, q1: usize, q2: usize) -> SimResult<()> {
        self.apply(&Operator::swap(), &[q1, q2])
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Marginal distribution over `qubits`.
    ///
    /// Entry `k` is the probability of reading `k`, where bit `i` of `k` is
    /// the value of `qubits[i]`.
    pub fn outcome_probabilities(&self, qubits: &[usize]) -> SimResult<Vec<f64>> {
        self.validate(&[], qubits, qubits.len())?;
        let mut probs = vec![0.0; 1usize << qubits.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            probs[gather_bits(i, qubits)] += amp.norm_sqr();
        }
        Ok(probs)
    }

    /// Measure `qubits`, collapse the register onto the outcome and
    /// renormalize.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubits: &[usize], rng: &mut R) -> SimResult<usize> {
        if qubits.is_empty() {
            return Err(SimError::ArityMismatch {
                expected: 1,
                got: 0,
            });
        }
        let probs = self.outcome_probabilities(qubits)?;
        let total: f64 = probs.iter().sum();
        let r: f64 = rng.r#gen::<f64>() * total;

        let mut cumulative = 0.0;
        let mut outcome = None;
        for (k, &p) in probs.iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            outcome = Some(k);
            if r < cumulative {
                break;
            }
        }
        // Rounding can leave r just above the final cumulative sum; the last
        // populated outcome absorbs it.
        let Some(outcome) = outcome else {
            return Err(self.violation("measure", total));
        };
        if outcome >= probs.len() {
            return Err(SimError::OutcomeOutOfRange {
                outcome,
                num_bits: qubits.len(),
            });
        }

        let scale = 1.0 / probs[outcome].sqrt();
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if gather_bits(i, qubits) == outcome {
                *amp *= scale;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }
        trace!(
            outcome,
            probability = probs[outcome],
            measured = qubits.len(),
            "measured"
        );
        self.check_normalized("measure")?;
        Ok(outcome)
    }

    /// Measure `qubit` and flip it back to `|0⟩` if it read 1.
    pub fn reset<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> SimResult<()> {
        if self.measure(&[qubit], rng)? == 1 {
            self.x(qubit)?;
        }
        Ok(())
    }

    /// Convert a full-register outcome to a bitstring, qubit 0 first.
    pub fn outcome_to_bitstring(&self, outcome: usize) -> String {
        format!("{:0width$b}", outcome, width = self.num_qubits)
            .chars()
            .rev()
            .collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply_single(&mut self, m: &Matrix2, control_mask: usize, target: usize) {
        let mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 && i & control_mask == control_mask {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_permutation(&mut self, p: &Permutation, control_mask: usize, targets: &[usize]) {
        let target_mask = mask_of(targets);
        let mut next = self.amplitudes.clone();
        for (i, &amp) in self.amplitudes.iter().enumerate() {
            if i & control_mask != control_mask {
                continue;
            }
            let sub = gather_bits(i, targets);
            let image = p.apply(sub);
            if image != sub {
                next[(i & !target_mask) | scatter_bits(image, targets)] = amp;
            }
        }
        self.amplitudes = next;
    }

    fn validate(&self, controls: &[usize], targets: &[usize], arity: usize) -> SimResult<()> {
        if targets.len() != arity {
            return Err(SimError::ArityMismatch {
                expected: arity,
                got: targets.len(),
            });
        }
        let mut used = 0usize;
        for &q in controls.iter().chain(targets) {
            if q >= self.num_qubits {
                return Err(SimError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: self.num_qubits,
                });
            }
            if used & (1 << q) != 0 {
                return Err(SimError::DuplicateQubit(q));
            }
            used |= 1 << q;
        }
        Ok(())
    }

    /// Probability conservation check; compiled out of release builds.
    fn check_normalized(&self, operation: &'static str) -> SimResult<()> {
        if cfg!(debug_assertions) {
            let norm_sqr = self.norm_sqr();
            if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
                return Err(self.violation(operation, norm_sqr));
            }
        }
        Ok(())
    }

    fn violation(&self, operation: &'static str, norm_sqr: f64) -> SimError {
        SimError::InvariantViolation {
            operation,
            norm_sqr,
            dump: self.state_dump(),
        }
    }

    /// Nonzero amplitudes, one per line.
    fn state_dump(&self) -> String {
        let mut dump = String::new();
        for (i, amp) in self.amplitudes.iter().enumerate() {
            if amp.norm_sqr() > 0.0 {
                let _ = writeln!(
                    dump,
                    "  |{}⟩: {:+.6} {:+.6}i",
                    self.outcome_to_bitstring(i),
                    amp.re,
                    amp.im
                );
            }
        }
        dump
    }
}

/// Bitmask with one bit set per listed qubit.
fn mask_of(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |mask, &q| mask | (1 << q))
}

/// Collect the bits of `index` at `qubits` into a compact integer.
fn gather_bits(index: usize, qubits: &[usize]) -> usize {
    qubits
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &q)| acc | (((index >> q) & 1) << i))
}

/// Spread the bits of `value` onto the positions listed in `qubits`.
fn scatter_bits(value: usize, qubits: &[usize]) -> usize {
    qubits
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &q)| acc | (((value >> i) & 1) << q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let reg = QuantumRegister::new(2, 0).unwrap();
        assert!(approx_eq(reg.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[3], Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_initial_value_encoding() {
        let reg = QuantumRegister::new(3, 5).unwrap();
        assert!(approx_eq(reg.amplitudes[5], Complex64::new(1.0, 0.0)));
        assert_eq!(reg.outcome_to_bitstring(5), "101");
        assert!(matches!(
            QuantumRegister::new(3, 8),
            Err(SimError::InitialValueOutOfRange { .. })
        ));
        assert!(matches!(
            QuantumRegister::new(0, 0),
            Err(SimError::InvalidQubitCount { .. })
        ));
    }

    #[test]
    fn test_hadamard() {
        let mut reg = QuantumRegister::new(1, 0).unwrap();
        reg.h(0).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(reg.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(reg.amplitudes[1], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_bell_state() {
        let mut reg = QuantumRegister::new(2, 0).unwrap();
        reg.h(0).unwrap();
        reg.apply_controlled(&Operator::pauli_x(), &[0], &[1]).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(reg.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(reg.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_x_gate() {
        let mut reg = QuantumRegister::new(1, 0).unwrap();
        reg.x(0).unwrap();

        assert!(approx_eq(reg.amplitudes[0], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(reg.amplitudes[1], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_permutation_on_scattered_targets() {
        // Targets 0 and 2 hold the value 1 (bit 0 set); cycling the two-qubit
        // block 1 -> 2 must set qubit 2 and clear qubit 0.
        let mut reg = QuantumRegister::new(3, 0b001).unwrap();
        let cycle = Operator::permutation(vec![1, 2, 3, 0]).unwrap();
        reg.apply(&cycle, &[0, 2]).unwrap();
        assert!(approx_eq(reg.amplitudes[0b100], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_controlled_gate_respects_control() {
        let mut reg = QuantumRegister::new(2, 0b00).unwrap();
        reg.apply_controlled(&Operator::pauli_x(), &[0], &[1]).unwrap();
        assert!(approx_eq(reg.amplitudes[0], Complex64::new(1.0, 0.0)));

        let mut reg = QuantumRegister::new(2, 0b01).unwrap();
        reg.apply_controlled(&Operator::pauli_x(), &[0], &[1]).unwrap();
        assert!(approx_eq(reg.amplitudes[0b11], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_swap() {
        let mut reg = QuantumRegister::new(3, 0b001).unwrap();
        reg.swap(0, 2).unwrap();
        assert!(approx_eq(reg.amplitudes[0b100], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_rejects_bad_qubit_lists() {
        let mut reg = QuantumRegister::new(2, 0).unwrap();
        assert!(matches!(
            reg.h(2),
            Err(SimError::QubitOutOfRange { qubit: 2, .. })
        ));
        assert!(matches!(
            reg.apply_controlled(&Operator::hadamard(), &[1], &[1]),
            Err(SimError::DuplicateQubit(1))
        ));
        assert!(matches!(
            reg.apply(&Operator::swap(), &[0]),
            Err(SimError::ArityMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_measure_deterministic() {
        // |1⟩ state should always measure 1
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut reg = QuantumRegister::new(1, 1).unwrap();
            assert_eq!(reg.measure(&[0], &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_measure_collapses_entangled_partner() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut reg = QuantumRegister::new(2, 0).unwrap();
            reg.h(0).unwrap();
            reg.apply_controlled(&Operator::pauli_x(), &[0], &[1]).unwrap();

            let first = reg.measure(&[0], &mut rng).unwrap();
            let expected = if first == 1 { 0b11 } else { 0b00 };
            assert!((reg.probability(expected) - 1.0).abs() < 1e-12);
            assert_eq!(reg.measure(&[1], &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn test_outcome_probabilities_subset() {
        let mut reg = QuantumRegister::new(3, 0).unwrap();
        reg.h(1).unwrap();
        let probs = reg.outcome_probabilities(&[1, 2]).unwrap();
        assert!((probs[0b00] - 0.5).abs() < 1e-12);
        assert!((probs[0b01] - 0.5).abs() < 1e-12);
        assert!(probs[0b10].abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut reg = QuantumRegister::new(2, 0b11).unwrap();
        reg.reset(0, &mut rng).unwrap();
        assert!((reg.probability(0b10) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_amplitudes_requires_normalization() {
        let half = Complex64::new(0.5, 0.0);
        assert!(QuantumRegister::from_amplitudes(vec![half; 4]).is_ok());
        assert!(matches!(
            QuantumRegister::from_amplitudes(vec![half; 2]),
            Err(SimError::InvalidAmplitudes(_))
        ));
        assert!(QuantumRegister::from_amplitudes(vec![half; 3]).is_err());
    }

    // Operator::Single is public, so a non-unitary matrix can bypass
    // Operator::single's check and reach the register.
    #[test]
    #[cfg(debug_assertions)]
    fn test_non_unitary_gate_reports_violation() {
        let two = Complex64::new(2.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let mut reg = QuantumRegister::new(2, 0b01).unwrap();
        let err = reg
            .apply(&Operator::Single([[two, zero], [zero, two]]), &[0])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        match &err {
            SimError::InvariantViolation {
                operation,
                norm_sqr,
                dump,
            } => {
                assert_eq!(*operation, "apply");
                assert!((norm_sqr - 4.0).abs() < 1e-12);
                assert!(dump.contains("|10⟩: +2.000000 +0.000000i"), "{dump}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("norm² = 4"));
    }

    #[test]
    fn test_measuring_empty_state_reports_violation() {
        let zero = Complex64::new(0.0, 0.0);
        let mut reg = QuantumRegister::new(1, 0).unwrap();
        let annihilate = reg.apply(&Operator::Single([[zero, zero], [zero, zero]]), &[0]);
        if cfg!(debug_assertions) {
            assert!(annihilate.is_err());
        }
        assert_eq!(reg.norm_sqr(), 0.0);

        let mut rng = StdRng::seed_from_u64(0);
        let err = reg.measure(&[0], &mut rng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(matches!(
            err,
            SimError::InvariantViolation {
                operation: "measure",
                ..
            }
        ));
    }

    #[test]
    fn test_bit_helpers() {
        assert_eq!(gather_bits(0b1010, &[1, 3]), 0b11);
        assert_eq!(gather_bits(0b1010, &[0, 1]), 0b10);
        assert_eq!(scatter_bits(0b11, &[1, 3]), 0b1010);
        assert_eq!(mask_of(&[0, 2]), 0b101);
    }
}
