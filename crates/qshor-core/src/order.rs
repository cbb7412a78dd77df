//! Order finding by quantum phase estimation.
//!
//! The full circuit uses `m = 2·ceil(log2 N)` control qubits and
//! `n = ceil(log2 N)` target qubits:
//!
//! ```text
//!   controls |0…0⟩ ─ H^⊗m ─●──────●─── … ─ QFT† ─ measure → y
//!                          │      │
//!   targets  |0…01⟩ ────── M_a ── M_a² ─ …
//! ```
//!
//! Control `j` drives `M_{a^(2^j) mod N}`. The measured `y / 2^m`
//! approximates `s/r` for the order `r` of `a`, which continued fractions
//! recover.
//!
//! When the full circuit is too wide to simulate, the single-control variant
//! recycles one control qubit `m` times, applying the inverse QFT's phase
//! corrections classically from the bits already measured. Its outcome
//! distribution is the same, and it needs only `n + 1` qubits.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::time::Instant;
use tracing::{debug, trace};

use qshor_sim::{MAX_QUBITS, QuantumRegister, inverse_qft};

use crate::config::{PhaseEstimation, ShorConfig};
use crate::error::{ShorError, ShorResult};
use crate::modmul::ModularMultiplier;
use crate::number_theory::{ceil_log2, continued_fraction_convergents};

/// Result of one phase-estimation run.
#[derive(Debug, Clone)]
pub struct MeasurementOutcome {
    value: u64,
    precision_bits: u32,
    strategy: PhaseEstimation,
    register: QuantumRegister,
}

impl MeasurementOutcome {
    /// The measured integer `y ∈ [0, 2^m)`.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The number of control bits `m`.
    pub fn precision_bits(&self) -> u32 {
        self.precision_bits
    }

    /// The estimated phase `y / 2^m`.
    pub fn phase(&self) -> f64 {
        self.value as f64 / f64::from(self.precision_bits).exp2()
    }

    /// Layout that produced this outcome (`Full` or `Semiclassical`).
    pub fn strategy(&self) -> PhaseEstimation {
        self.strategy
    }

    /// The collapsed register after measurement.
    pub fn register(&self) -> &QuantumRegister {
        &self.register
    }
}

/// Candidate orders recovered from a measured phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEstimate {
    measured: u64,
    precision_bits: u32,
    candidates: Vec<u64>,
}

impl OrderEstimate {
    /// Expand `y / 2^m` into continued-fraction convergents and keep the
    /// distinct denominators `<= modulus`, smallest first.
    pub fn from_measurement(measured: u64, precision_bits: u32, modulus: u64) -> ShorResult<Self> {
        let denominator =
            1u64.checked_shl(precision_bits)
                .ok_or(ShorError::RegisterTooLarge {
                    modulus,
                    required: precision_bits as usize,
                    limit: 63,
                })?;
        let mut candidates: Vec<u64> = continued_fraction_convergents(measured, denominator, modulus)?
            .map(|c| c.denominator)
            .collect();
        candidates.dedup();
        Ok(Self {
            measured,
            precision_bits,
            candidates,
        })
    }

    /// Shorthand for [`OrderEstimate::from_measurement`] on a run's outcome.
    pub fn from_outcome(outcome: &MeasurementOutcome, modulus: u64) -> ShorResult<Self> {
        Self::from_measurement(outcome.value, outcome.precision_bits, modulus)
    }

    /// The measured integer `y`.
    pub fn measured(&self) -> u64 {
        self.measured
    }

    /// The number of control bits `m`.
    pub fn precision_bits(&self) -> u32 {
        self.precision_bits
    }

    /// Candidate orders, ascending.
    pub fn candidates(&self) -> &[u64] {
        &self.candidates
    }
}

/// Register layout chosen for a modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitLayout {
    /// Target qubits `ceil(log2 N)`.
    pub target_qubits: usize,
    /// Control bits `m = 2 · target_qubits`.
    pub precision_bits: usize,
    /// Resolved strategy (never `Auto`).
    pub strategy: PhaseEstimation,
}

impl CircuitLayout {
    /// Qubits the simulated register holds.
    pub fn register_qubits(&self) -> usize {
        match self.strategy {
            PhaseEstimation::Semiclassical => self.target_qubits + 1,
            _ => self.target_qubits + self.precision_bits,
        }
    }
}

/// Runs the phase-estimation circuit; one measurement per call, no retries.
#[derive(Debug, Clone)]
pub struct OrderFinder {
    max_register_qubits: usize,
    strategy: PhaseEstimation,
    deadline: Option<Instant>,
}

impl Default for OrderFinder {
    fn default() -> Self {
        Self::from_config(&ShorConfig::default())
    }
}

impl OrderFinder {
    /// Finder with the layout settings of `config`.
    ///
    /// `config.deadline` is a per-call budget; the driver turns it into an
    /// instant with [`OrderFinder::with_deadline`].
    pub fn from_config(config: &ShorConfig) -> Self {
        Self {
            max_register_qubits: config.max_register_qubits,
            strategy: config.strategy,
            deadline: None,
        }
    }

    /// Override the circuit layout.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PhaseEstimation) -> Self {
        self.strategy = strategy;
        self
    }

    /// Override the widest full circuit `Auto` accepts.
    #[must_use]
    pub fn with_max_register_qubits(mut self, qubits: usize) -> Self {
        self.max_register_qubits = qubits;
        self
    }

    /// Abort with [`ShorError::DeadlineExceeded`] once `deadline` passes.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Decide the register layout for `modulus`.
    pub fn layout(&self, modulus: u64) -> ShorResult<CircuitLayout> {
        if modulus < 2 {
            return Err(ShorError::InputTooSmall(modulus));
        }
        let target_qubits = ceil_log2(modulus) as usize;
        let precision_bits = 2 * target_qubits;
        let full_width = target_qubits + precision_bits;
        let strategy = match self.strategy {
            PhaseEstimation::Auto if full_width <= self.max_register_qubits => PhaseEstimation::Full,
            PhaseEstimation::Auto => PhaseEstimation::Semiclassical,
            explicit => explicit,
        };
        let layout = CircuitLayout {
            target_qubits,
            precision_bits,
            strategy,
        };
        if layout.register_qubits() > MAX_QUBITS {
            return Err(ShorError::RegisterTooLarge {
                modulus,
                required: layout.register_qubits(),
                limit: MAX_QUBITS,
            });
        }
        Ok(layout)
    }

    /// Run phase estimation for `a` modulo `modulus` and measure.
    pub fn find_order<R: Rng + ?Sized>(
        &self,
        a: u64,
        modulus: u64,
        rng: &mut R,
    ) -> ShorResult<MeasurementOutcome> {
        let layout = self.layout(modulus)?;
        let multiplier = ModularMultiplier::new(a, modulus, layout.target_qubits)?;
        debug!(
            a,
            modulus,
            target_qubits = layout.target_qubits,
            precision_bits = layout.precision_bits,
            strategy = %layout.strategy,
            "running phase estimation"
        );

        let outcome = match layout.strategy {
            PhaseEstimation::Semiclassical => self.run_semiclassical(&multiplier, &layout, rng)?,
            _ => self.run_full(&multiplier, &layout, rng)?,
        };
        debug!(
            measured = outcome.value,
            phase = outcome.phase(),
            "phase estimation finished"
        );
        Ok(outcome)
    }

    fn run_full<R: Rng + ?Sized>(
        &self,
        multiplier: &ModularMultiplier,
        layout: &CircuitLayout,
        rng: &mut R,
    ) -> ShorResult<MeasurementOutcome> {
        let n = layout.target_qubits;
        let m = layout.precision_bits;
        let targets: Vec<usize> = (0..n).collect();
        let controls: Vec<usize> = (n..n + m).collect();

        // Setup: targets hold |1⟩, controls |0⟩.
        let mut register = QuantumRegister::new(n + m, 1)?;
        self.check_deadline("setup")?;

        for &c in &controls {
            register.h(c)?;
        }
        self.check_deadline("superposition")?;

        let mut rung = *multiplier;
        for (j, &c) in controls.iter().enumerate() {
            if j > 0 {
                rung = rung.squared_power(1);
            }
            // a^(2^j) ≡ 1 makes the rung the identity.
            if rung.base() != 1 {
                register.apply_controlled(&rung.to_operator()?, &[c], &targets)?;
            }
            trace!(j, power = rung.base(), "applied ladder rung");
            self.check_deadline("exponentiation ladder")?;
        }

        inverse_qft(&mut register, &controls)?;
        self.check_deadline("inverse QFT")?;

        let value = register.measure(&controls, rng)? as u64;
        Ok(MeasurementOutcome {
            value,
            precision_bits: m as u32,
            strategy: PhaseEstimation::Full,
            register,
        })
    }

    fn run_semiclassical<R: Rng + ?Sized>(
        &self,
        multiplier: &ModularMultiplier,
        layout: &CircuitLayout,
        rng: &mut R,
    ) -> ShorResult<MeasurementOutcome> {
        let n = layout.target_qubits;
        let m = layout.precision_bits;
        let targets: Vec<usize> = (0..n).collect();
        let control = n;

        let mut register = QuantumRegister::new(n + 1, 1)?;
        self.check_deadline("setup")?;

        let rungs: Vec<ModularMultiplier> =
            std::iter::successors(Some(*multiplier), |r| Some(r.squared_power(1)))
                .take(m)
                .collect();

        // Bit l of y comes from rung m-1-l; earlier bits feed the phase
        // correction that the inverse QFT's controlled rotations would apply.
        let mut value = 0u64;
        for l in 0..m {
            let rung = &rungs[m - 1 - l];
            if l > 0 {
                register.reset(control, rng)?;
            }
            register.h(control)?;
            if rung.base() != 1 {
                register.apply_controlled(&rung.to_operator()?, &[control], &targets)?;
            }
            let correction: f64 = (0..l)
                .filter(|i| (value >> i) & 1 == 1)
                .map(|i| 1.0 / f64::from((l - i + 1) as u32).exp2())
                .sum();
            if correction != 0.0 {
                register.phase(control, -TAU * correction)?;
            }
            register.h(control)?;

            let bit = register.measure(&[control], rng)?;
            value |= (bit as u64) << l;
            trace!(round = l, bit, "single-control round");
            self.check_deadline("single-control round")?;
        }

        Ok(MeasurementOutcome {
            value,
            precision_bits: m as u32,
            strategy: PhaseEstimation::Semiclassical,
            register,
        })
    }

    fn check_deadline(&self, stage: &'static str) -> ShorResult<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(ShorError::DeadlineExceeded { stage })
            }
            _ => Ok(()),
        }
    }
}

/// Run phase estimation for `a` modulo `modulus` with the default layout.
pub fn find_order<R: Rng + ?Sized>(
    a: u64,
    modulus: u64,
    rng: &mut R,
) -> ShorResult<MeasurementOutcome> {
    OrderFinder::default().find_order(a, modulus, rng)
}
