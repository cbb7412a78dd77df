//! Order command implementation.
//!
//! Runs a single phase-estimation circuit and shows what the measurement
//! says about the order of A modulo N.

use anyhow::Result;
use console::style;
use serde::Serialize;
use tracing::info;

use qshor_core::number_theory::multiplicative_order;
use qshor_core::{OrderEstimate, OrderFinder, PhaseEstimation, mod_pow};

use super::common::{OutputFormat, load_config, make_rng, resolve_seed, spinner};

#[derive(Serialize)]
struct OrderReport {
    a: u64,
    n: u64,
    seed: u64,
    strategy: PhaseEstimation,
    register_qubits: usize,
    measured: u64,
    precision_bits: u32,
    phase: f64,
    candidates: Vec<u64>,
    order: Option<u64>,
}

/// Execute the order command.
pub fn execute(
    a: u64,
    n: u64,
    seed: Option<u64>,
    strategy: Option<PhaseEstimation>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(None, strategy);
    let seed = resolve_seed(seed);
    let finder = OrderFinder::from_config(&config);
    let layout = finder.layout(n)?;

    if format == OutputFormat::Table {
        println!(
            "{} Estimating the order of {} mod {} ({} qubits, {} layout, seed {})",
            style("→").cyan().bold(),
            style(a).green(),
            style(n).green(),
            layout.register_qubits(),
            layout.strategy,
            style(seed).yellow()
        );
    }

    info!(
        a,
        n,
        seed,
        strategy = %layout.strategy,
        register_qubits = layout.register_qubits(),
        "starting order run"
    );
    let progress = spinner("Running phase estimation...".to_string(), format)?;
    let result = finder.find_order(a, n, &mut make_rng(seed));
    progress.finish_and_clear();
    let outcome = result?;
    let estimate = OrderEstimate::from_outcome(&outcome, n)?;

    // The smallest candidate that actually returns a to 1.
    let mut order = None;
    for &r in estimate.candidates() {
        if mod_pow(a, r, n)? == 1 {
            order = Some(r);
            break;
        }
    }

    match format {
        OutputFormat::Json => {
            let report = OrderReport {
                a,
                n,
                seed,
                strategy: outcome.strategy(),
                register_qubits: outcome.register().num_qubits(),
                measured: outcome.value(),
                precision_bits: outcome.precision_bits(),
                phase: outcome.phase(),
                candidates: estimate.candidates().to_vec(),
                order,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!(
                "\n  Measured:   y = {} of 2^{} (phase {:.6})",
                style(outcome.value()).cyan(),
                outcome.precision_bits(),
                outcome.phase()
            );
            println!("  Candidates: {:?}", estimate.candidates());
            match order {
                Some(r) => println!(
                    "{} order of {a} mod {n} is {}",
                    style("✓").green().bold(),
                    style(r).cyan().bold()
                ),
                None => {
                    let actual = multiplicative_order(a, n)
                        .map_or_else(|| "undefined".to_string(), |r| r.to_string());
                    println!(
                        "{} no candidate is the order (true order {actual}); rerun with another seed",
                        style("✗").yellow().bold()
                    );
                }
            }
        }
    }

    Ok(())
}
