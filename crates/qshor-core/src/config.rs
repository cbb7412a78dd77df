//! Driver configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the phase-estimation circuit is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseEstimation {
    /// Full circuit when it fits `max_register_qubits`, single-control otherwise.
    #[default]
    Auto,
    /// `2n` control qubits, inverse QFT, one final measurement.
    Full,
    /// One recycled control qubit with measurement feedback.
    Semiclassical,
}

impl fmt::Display for PhaseEstimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Full => "full",
            Self::Semiclassical => "semiclassical",
        })
    }
}

impl FromStr for PhaseEstimation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "full" => Ok(Self::Full),
            "semiclassical" | "single" => Ok(Self::Semiclassical),
            other => Err(format!(
                "unknown phase estimation strategy '{other}' (expected auto, full or semiclassical)"
            )),
        }
    }
}

/// Settings for [`Shor`](crate::Shor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShorConfig {
    /// Attempts per `factor` call before giving up.
    pub max_attempts: usize,
    /// Widest register the full phase-estimation circuit may use under
    /// [`PhaseEstimation::Auto`].
    pub max_register_qubits: usize,
    /// Circuit layout.
    pub strategy: PhaseEstimation,
    /// Wall-clock budget per `factor` call, checked between stages.
    pub deadline: Option<Duration>,
}

impl Default for ShorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_register_qubits: 18,
            strategy: PhaseEstimation::Auto,
            deadline: None,
        }
    }
}

impl ShorConfig {
    /// Override the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the full-circuit width limit.
    #[must_use]
    pub fn with_max_register_qubits(mut self, qubits: usize) -> Self {
        self.max_register_qubits = qubits;
        self
    }

    /// Override the circuit layout.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PhaseEstimation) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set a deadline per `factor` call.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Create config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `QSHOR_MAX_ATTEMPTS`: attempts per factor call (default: 10)
    /// - `QSHOR_MAX_QUBITS`: full-circuit width limit (default: 18)
    /// - `QSHOR_STRATEGY`: "auto", "full" or "semiclassical" (default: "auto")
    /// - `QSHOR_DEADLINE_MS`: deadline per factor call in milliseconds (optional)
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: lookup("QSHOR_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            max_register_qubits: lookup("QSHOR_MAX_QUBITS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_register_qubits),
            strategy: lookup("QSHOR_STRATEGY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.strategy),
            deadline: lookup("QSHOR_DEADLINE_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .or(defaults.deadline),
        }
    }
}
