//! Quantum Fourier transform and its inverse.
//!
//! `qubits[0]` is the least significant bit of the transformed integer, so
//! `qft` maps `|x⟩ → 2^{-m/2} Σ_y e^{2πixy/2^m} |y⟩` over the listed qubits.

use std::f64::consts::TAU;

use crate::error::SimResult;
use crate::register::QuantumRegister;

/// One gate of the textbook QFT circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QftGate {
    H(usize),
    /// Controlled `R_k` on `target`.
    ControlledRk { control: usize, target: usize, k: u32 },
    Swap(usize, usize),
}

/// Gate sequence: for each qubit from most significant down, H then the
/// controlled rotations from every less-significant qubit; then a
/// bit-reversal by swaps.
fn qft_gates(qubits: &[usize]) -> Vec<QftGate> {
    let m = qubits.len();
    let mut gates = Vec::with_capacity(m * (m + 1) / 2 + m / 2);
    for t in (0..m).rev() {
        gates.push(QftGate::H(qubits[t]));
        for c in (0..t).rev() {
            gates.push(QftGate::ControlledRk {
                control: qubits[c],
                target: qubits[t],
                k: (t - c + 1) as u32,
            });
        }
    }
    for i in 0..m / 2 {
        gates.push(QftGate::Swap(qubits[i], qubits[m - 1 - i]));
    }
    gates
}

fn apply_gate(register: &mut QuantumRegister, gate: QftGate, sign: f64) -> SimResult<()> {
    match gate {
        QftGate::H(q) => register.h(q),
        QftGate::ControlledRk { control, target, k } => {
            register.controlled_phase(control, target, sign * TAU / f64::from(k).exp2())
        }
        QftGate::Swap(a, b) => register.swap(a, b),
    }
}

/// Apply the QFT to `qubits` (least significant first).
pub fn qft(register: &mut QuantumRegister, qubits: &[usize]) -> SimResult<()> {
    for gate in qft_gates(qubits) {
        apply_gate(register, gate, 1.0)?;
    }
    Ok(())
}

/// Apply the inverse QFT: the QFT circuit reversed, with negated angles.
pub fn inverse_qft(register: &mut QuantumRegister, qubits: &[usize]) -> SimResult<()> {
    for gate in qft_gates(qubits).into_iter().rev() {
        apply_gate(register, gate, -1.0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_gate_count() {
        // 4 H, 6 controlled rotations, 2 swaps
        assert_eq!(qft_gates(&[0, 1, 2, 3]).len(), 12);
        assert!(qft_gates(&[]).is_empty());
    }

    #[test]
    fn test_qft_of_zero_is_uniform() {
        let mut reg = QuantumRegister::new(3, 0).unwrap();
        qft(&mut reg, &[0, 1, 2]).unwrap();
        let expected = 1.0 / 8.0_f64.sqrt();
        for amp in reg.amplitudes() {
            assert!((amp - Complex64::new(expected, 0.0)).norm() < 1e-10);
        }
    }

    #[test]
    fn test_qft_matches_dft() {
        let m = 3;
        let dim = 1usize << m;
        for x in 0..dim {
            let mut reg = QuantumRegister::new(m, x).unwrap();
            qft(&mut reg, &[0, 1, 2]).unwrap();
            for y in 0..dim {
                let angle = TAU * (x * y) as f64 / dim as f64;
                let expected = Complex64::from_polar(1.0 / (dim as f64).sqrt(), angle);
                let got = reg.amplitude(y).unwrap();
                assert!((got - expected).norm() < 1e-10, "x={x} y={y}: {got} != {expected}");
            }
        }
    }

    #[test]
    fn test_inverse_qft_concentrates_periodic_phase() {
        // Phase e^{2πi·x·3/8} over three qubits is QFT|3⟩; the inverse must
        // return exactly |3⟩.
        let dim = 8usize;
        let amps = (0..dim)
            .map(|x| Complex64::from_polar(1.0 / (dim as f64).sqrt(), TAU * (3 * x) as f64 / 8.0))
            .collect();
        let mut reg = QuantumRegister::from_amplitudes(amps).unwrap();
        inverse_qft(&mut reg, &[0, 1, 2]).unwrap();
        assert!((reg.probability(3) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_subset_leaves_other_qubits_alone() {
        // Qubit 1 is outside the transform and stays |1⟩.
        let mut reg = QuantumRegister::new(3, 0b010).unwrap();
        qft(&mut reg, &[0, 2]).unwrap();
        let probs = reg.outcome_probabilities(&[1]).unwrap();
        assert!((probs[1] - 1.0).abs() < 1e-10);
    }
}
