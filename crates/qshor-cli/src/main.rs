//! qshor Command-Line Interface
//!
//! Factor integers and estimate multiplicative orders with a simulated run
//! of Shor's algorithm.
//!
//! ```text
//! qshor factor 21 --seed 7
//! qshor factor 945 --full --format json
//! qshor order 7 15 --strategy semiclassical
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use console::style;
use qshor_core::PhaseEstimation;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::OutputFormat;
use commands::{factor, order, version};

/// qshor - Shor's algorithm on an exact statevector simulator
#[derive(Parser)]
#[command(name = "qshor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a nontrivial factor of N
    Factor {
        /// The integer to factor
        n: u64,

        /// Seed for the random number generator (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Attempts before giving up (overrides QSHOR_MAX_ATTEMPTS)
        #[arg(short, long)]
        attempts: Option<usize>,

        /// Phase-estimation layout: auto, full or semiclassical
        #[arg(long)]
        strategy: Option<PhaseEstimation>,

        /// Decompose N into all of its prime factors
        #[arg(long)]
        full: bool,

        /// Run attempts in parallel
        #[arg(long, conflicts_with = "full")]
        parallel: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run one order-finding circuit for A modulo N
    Order {
        /// The base A, coprime to N
        a: u64,

        /// The modulus N
        n: u64,

        /// Seed for the random number generator (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Phase-estimation layout: auto, full or semiclassical
        #[arg(long)]
        strategy: Option<PhaseEstimation>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let result = match cli.command {
        Commands::Factor {
            n,
            seed,
            attempts,
            strategy,
            full,
            parallel,
            format,
        } => factor::execute(&factor::FactorArgs {
            n,
            seed,
            attempts,
            strategy,
            full,
            parallel,
            format,
        }),

        Commands::Order {
            a,
            n,
            seed,
            strategy,
            format,
        } => order::execute(a, n, seed, strategy, format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
