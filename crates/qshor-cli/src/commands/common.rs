//! Shared helpers for CLI commands.

use std::time::Duration;

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use qshor_core::{PhaseEstimation, ShorConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Table,
    /// One JSON document on stdout.
    Json,
}

/// Environment config with command-line overrides applied.
pub fn load_config(attempts: Option<usize>, strategy: Option<PhaseEstimation>) -> ShorConfig {
    let mut config = ShorConfig::from_env();
    if let Some(attempts) = attempts {
        config = config.with_max_attempts(attempts);
    }
    if let Some(strategy) = strategy {
        config = config.with_strategy(strategy);
    }
    config
}

/// The seed to use: the given one, or a fresh random one that gets reported
/// so the run can be repeated.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Seeded generator for a run.
pub fn make_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Spinner on stderr, hidden for JSON output.
pub fn spinner(message: String, format: OutputFormat) -> anyhow::Result<ProgressBar> {
    if format == OutputFormat::Json {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// `3^3 × 5 × 7` for an ascending list of primes.
pub fn format_factorization(primes: &[u64]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < primes.len() {
        let p = primes[i];
        let count = primes[i..].iter().take_while(|&&q| q == p).count();
        parts.push(if count == 1 {
            p.to_string()
        } else {
            format!("{p}^{count}")
        });
        i += count;
    }
    parts.join(" × ")
}
