//! Batch command implementation.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use amplify_grover::{BatchDriver, FileTable};

use super::common::{ConfigOverrides, make_rng, open_session, resolve_config};

/// Execute the batch command.
pub async fn execute(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overrides: ConfigOverrides,
) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;
    info!(?config, "resolved configuration");

    println!(
        "{} Running batch {} → {} ({} shots, concurrency {}, on failure: {})",
        style("→").cyan().bold(),
        style(input).green(),
        style(output).green(),
        config.shots,
        config.concurrency,
        style(config.failure_policy).yellow()
    );

    let session = open_session(&config).await?;
    let driver = BatchDriver::new(session, &config);
    let mut rng = make_rng(config.seed);
    let mut source = FileTable::new(input, output);
    let mut sink = source.clone();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Running rows...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = driver
        .run_table(&mut source, &mut sink, &mut rng)
        .await
        .with_context(|| format!("Batch from {input} failed"));
    spinner.finish_and_clear();
    let report = report?;
    let jobs = driver.close();

    println!(
        "\n{} {} rows ({} completed, {} skipped, {} jobs)",
        style("✓").green().bold(),
        report.rows.len(),
        report.completed(),
        report.skipped,
        jobs
    );
    println!("  {:>6}  {:>9}  {:>11}", "qubits", "threshold", "probability");
    for row in &report.rows {
        let probability = match row.probability {
            Some(p) => style(format!("{p:.4}")).green(),
            None => style("skipped".to_string()).red(),
        };
        println!("  {:>6}  {:>9}  {:>11}", row.qubits, row.threshold, probability);
    }
    println!("\n  Results written to {}", style(output).cyan());

    Ok(())
}
