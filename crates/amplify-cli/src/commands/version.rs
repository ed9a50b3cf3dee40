//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Grover search with randomized early stopping",
        style("Amplify").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  amplify-ir           Circuit intermediate representation");
    println!("  amplify-hal          Execution backend abstraction");
    println!("  amplify-adapter-sim  Local statevector simulator");
    println!("  amplify-grover       Oracle, diffusion, iteration and batch driver");
    println!("  amplify-cli          Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
