//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Shor's algorithm on an exact statevector simulator",
        style("qshor").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qshor-sim   Statevector register, gates and QFT");
    println!("  qshor-core  Number theory, order finding and the Shor driver");
    println!("  qshor-cli   Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
