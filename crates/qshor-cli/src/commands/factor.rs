//! Factor command implementation.

use std::time::Instant;

use anyhow::Result;
use console::style;
use serde::Serialize;
use tracing::info;

use qshor_core::{Factor, PhaseEstimation, Shor};

use super::common::{
    OutputFormat, format_factorization, load_config, make_rng, resolve_seed, spinner,
};

/// Arguments of `qshor factor`.
pub struct FactorArgs {
    pub n: u64,
    pub seed: Option<u64>,
    pub attempts: Option<usize>,
    pub strategy: Option<PhaseEstimation>,
    pub full: bool,
    pub parallel: bool,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct FactorReport {
    n: u64,
    seed: u64,
    #[serde(flatten)]
    factor: Factor,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct FactorizationReport {
    n: u64,
    seed: u64,
    factors: Vec<u64>,
    elapsed_ms: u128,
}

/// Execute the factor command.
pub fn execute(args: &FactorArgs) -> Result<()> {
    let config = load_config(args.attempts, args.strategy);
    let seed = resolve_seed(args.seed);
    let shor = Shor::new(config);

    if args.format == OutputFormat::Table {
        println!(
            "{} Factoring {} (seed {}, {} attempts, {} layout)",
            style("→").cyan().bold(),
            style(args.n).green(),
            style(seed).yellow(),
            shor.config().max_attempts,
            shor.config().strategy
        );
    }

    info!(
        n = args.n,
        seed,
        attempts = shor.config().max_attempts,
        strategy = %shor.config().strategy,
        full = args.full,
        parallel = args.parallel,
        "starting factor run"
    );
    let progress = spinner(format!("Running Shor's algorithm on {}...", args.n), args.format)?;
    let start = Instant::now();

    if args.full {
        let mut rng = make_rng(seed);
        let result = shor.full_factorization(args.n, &mut rng);
        progress.finish_and_clear();
        let factors = result?;
        let elapsed_ms = start.elapsed().as_millis();

        match args.format {
            OutputFormat::Json => {
                let report = FactorizationReport {
                    n: args.n,
                    seed,
                    factors,
                    elapsed_ms,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => {
                println!(
                    "\n{} {} = {}",
                    style("✓").green().bold(),
                    args.n,
                    style(format_factorization(&factors)).cyan().bold()
                );
                println!("  Time: {elapsed_ms} ms");
            }
        }
        return Ok(());
    }

    let result = if args.parallel {
        shor.find_factor_parallel(args.n, seed)
    } else {
        shor.find_factor(args.n, &mut make_rng(seed))
    };
    progress.finish_and_clear();
    let factor = result?;
    let elapsed_ms = start.elapsed().as_millis();

    match args.format {
        OutputFormat::Json => {
            let report = FactorReport {
                n: args.n,
                seed,
                factor,
                elapsed_ms,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!(
                "\n{} {} = {} × {}",
                style("✓").green().bold(),
                args.n,
                style(factor.value).cyan().bold(),
                factor.cofactor
            );
            println!("  Found by: {}", factor.source);
            println!("  Time:     {elapsed_ms} ms");
        }
    }

    Ok(())
}
