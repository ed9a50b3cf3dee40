//! Run command implementation.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use amplify_grover::{
    BitString, RunReport, build_grover_circuit, build_grover_with_iterations, build_oracle,
    max_iterations, optimal_iterations, random_target, run_pipeline, success_probability,
    validate_threshold,
};

use super::common::{ConfigOverrides, make_rng, open_session, print_counts, resolve_config};

/// Execute the run command.
pub async fn execute(
    qubits: u32,
    threshold: f64,
    target: Option<&str>,
    iterations: Option<u32>,
    config_path: Option<&str>,
    overrides: ConfigOverrides,
) -> Result<()> {
    validate_threshold(threshold)?;
    let mut config = resolve_config(config_path, overrides)?;
    // The requested width beats the configured limit.
    config.max_qubits = config.max_qubits.max(qubits);
    let shots = config.shots;

    println!(
        "{} Grover search on {} qubits (P = {}, {} shots)",
        style("→").cyan().bold(),
        style(qubits).green(),
        style(threshold).yellow(),
        shots
    );

    let session = open_session(&config).await?;
    let mut rng = make_rng(config.seed);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Running search...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = match (target, iterations) {
        (None, None) => run_pipeline(&session, qubits, threshold, shots, &mut rng).await?,
        (target, iterations) => {
            let target = match target {
                Some(bits) => BitString::parse(bits)?,
                None => random_target(qubits, &mut rng)?,
            };
            let oracle = build_oracle(qubits, std::slice::from_ref(&target))?;
            let grover = match iterations {
                Some(k) => build_grover_with_iterations(qubits, k, &oracle)?,
                None => build_grover_circuit(qubits, threshold, &oracle, &mut rng)?,
            };
            let counts = session.sample(&grover.circuit, &target, shots).await?;
            RunReport {
                qubits,
                threshold,
                probability: success_probability(&counts, &target, shots),
                target,
                iterations: grover.iterations,
                counts,
            }
        }
    };
    spinner.finish_and_clear();
    session.close();

    println!("  Target:     {}", style(&report.target).cyan().bold());
    println!(
        "  Iterations: {} (bound {}, optimal {})",
        report.iterations,
        max_iterations(threshold)?,
        optimal_iterations(qubits, 1).map_or_else(|_| "-".to_string(), |k| k.to_string())
    );

    print_counts(&report.counts, shots, &report.target);

    println!(
        "\n  Success probability: {}",
        style(format!("{:.4}", report.probability)).yellow().bold()
    );
    Ok(())
}
