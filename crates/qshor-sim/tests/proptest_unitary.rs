//! Property-based tests for the statevector simulator.
//!
//! Random gate sequences must conserve probability, and the QFT must invert
//! exactly on random normalized states.

use num_complex::Complex64;
use proptest::prelude::*;
use qshor_sim::{Operator, Permutation, QuantumRegister, inverse_qft, qft};

/// Gate operations that can be applied to a register.
#[derive(Debug, Clone)]
enum GateOp {
    H(usize),
    Phase(usize, f64),
    ControlledPhase(usize, usize, f64),
    Swap(usize, usize),
    /// Cyclic shift of a two-qubit block by `step`, controlled on a third qubit.
    ControlledShift(usize, usize, usize, usize),
}

impl GateOp {
    fn apply(&self, reg: &mut QuantumRegister) {
        match *self {
            GateOp::H(q) => reg.h(q).unwrap(),
            GateOp::Phase(q, theta) => reg.phase(q, theta).unwrap(),
            GateOp::ControlledPhase(c, t, theta) => reg.controlled_phase(c, t, theta).unwrap(),
            GateOp::Swap(a, b) => reg.swap(a, b).unwrap(),
            GateOp::ControlledShift(c, t0, t1, step) => {
                let shift = Permutation::from_fn(2, |x| (x + step) % 4).unwrap();
                reg.apply_controlled(&Operator::from(shift), &[c], &[t0, t1]).unwrap();
            }
        }
    }

    fn inverse(&self) -> Self {
        match *self {
            GateOp::Phase(q, theta) => GateOp::Phase(q, -theta),
            GateOp::ControlledPhase(c, t, theta) => GateOp::ControlledPhase(c, t, -theta),
            GateOp::ControlledShift(c, t0, t1, step) => GateOp::ControlledShift(c, t0, t1, 4 - step),
            ref self_inverse => self_inverse.clone(),
        }
    }
}

/// Three distinct qubit indices in `[0, n)`; requires `n >= 3`.
fn distinct3(n: usize) -> impl Strategy<Value = (usize, usize, usize)> {
    (0..n, 1..n, 1..n - 1).prop_map(move |(a, db, dc)| {
        let b = (a + db) % n;
        // Walk from b, skipping a.
        let mut c = (b + dc) % n;
        if c == a {
            c = (c + 1) % n;
        }
        (a, b, c)
    })
}

fn arb_gate_op(n: usize) -> impl Strategy<Value = GateOp> {
    let theta = -std::f64::consts::PI..std::f64::consts::PI;
    prop_oneof![
        (0..n).prop_map(GateOp::H),
        (0..n, theta.clone()).prop_map(|(q, t)| GateOp::Phase(q, t)),
        (distinct3(n), theta).prop_map(|((c, t, _), a)| GateOp::ControlledPhase(c, t, a)),
        distinct3(n).prop_map(|(a, b, _)| GateOp::Swap(a, b)),
        (distinct3(n), 1usize..4).prop_map(|((c, t0, t1), step)| GateOp::ControlledShift(c, t0, t1, step)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = (usize, Vec<GateOp>)> {
    (3usize..=6).prop_flat_map(|n| (Just(n), prop::collection::vec(arb_gate_op(n), 1..=20)))
}

fn arb_state(n: usize) -> impl Strategy<Value = QuantumRegister> {
    prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 1usize << n)
        .prop_filter("state must have nonzero norm", |raw| {
            raw.iter().map(|(re, im)| re * re + im * im).sum::<f64>() > 1e-3
        })
        .prop_map(|raw| {
            let amps: Vec<Complex64> = raw.into_iter().map(|(re, im)| Complex64::new(re, im)).collect();
            let norm = amps.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
            QuantumRegister::from_amplitudes(amps.into_iter().map(|a| a / norm).collect()).unwrap()
        })
}

proptest! {
    #[test]
    fn gate_sequences_conserve_probability((n, ops) in arb_circuit()) {
        let mut reg = QuantumRegister::new(n, 0).unwrap();
        for op in &ops {
            op.apply(&mut reg);
            prop_assert!((reg.norm_sqr() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn gates_undo_through_inverses((n, ops) in arb_circuit()) {
        let mut reg = QuantumRegister::new(n, 0).unwrap();
        reg.h(0).unwrap();
        reg.h(n - 1).unwrap();
        let original = reg.clone();

        for op in &ops {
            op.apply(&mut reg);
        }
        for op in ops.iter().rev() {
            op.inverse().apply(&mut reg);
        }
        prop_assert!(reg.approx_eq(&original, 1e-9));
    }

    #[test]
    fn qft_round_trip_random_states(reg in (1usize..=5).prop_flat_map(arb_state)) {
        let qubits: Vec<usize> = (0..reg.num_qubits()).collect();
        let mut evolved = reg.clone();
        qft(&mut evolved, &qubits).unwrap();
        prop_assert!((evolved.norm_sqr() - 1.0).abs() < 1e-9);
        inverse_qft(&mut evolved, &qubits).unwrap();
        prop_assert!(evolved.approx_eq(&reg, 1e-9));
    }
}
