//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use rand::SeedableRng;
use rand::rngs::StdRng;

use amplify_adapter_sim::SimulatorBackend;
use amplify_grover::{AmplifyConfig, BackendSession, BitString, FailurePolicy};
use amplify_hal::{BackendConfig, BackendFactory, Counts};

/// Values given on the command line; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub shots: Option<u32>,
    pub seed: Option<u64>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub failure_policy: Option<FailurePolicy>,
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    fn apply(self, mut config: AmplifyConfig) -> AmplifyConfig {
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }
        config
    }
}

/// Resolve defaults, config file, environment and command-line flags.
pub fn resolve_config(path: Option<&str>, overrides: ConfigOverrides) -> Result<AmplifyConfig> {
    if let Some(path) = path {
        if !Path::new(path).exists() {
            anyhow::bail!("Config file not found: {path}");
        }
    }

    let config = AmplifyConfig::load(path.map(Path::new)).context("Failed to load configuration")?;
    let config = overrides.apply(config);
    config.validate()?;
    Ok(config)
}

/// Open a session on the local simulator.
pub async fn open_session(config: &AmplifyConfig) -> Result<BackendSession> {
    let mut backend_config = BackendConfig::new("simulator")
        .with_extra("max_qubits", serde_json::json!(config.max_qubits));
    if let Some(seed) = config.seed {
        backend_config = backend_config.with_extra("seed", serde_json::json!(seed));
    }
    let backend = SimulatorBackend::from_config(backend_config)?;

    let session = BackendSession::open(Arc::new(backend))
        .await?
        .with_poll_interval(config.poll_interval())
        .with_timeout(config.timeout());
    Ok(session)
}

/// Generator for the run: seeded when asked, otherwise from entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Print outcome counts as a table, marking the target.
///
/// Small registers list every basis state, including ones never observed.
pub fn print_counts(counts: &Counts, shots: u32, target: &BitString) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        shots
    );

    let total = f64::from(shots);
    let rows: Vec<(String, u64)> = if target.width() <= 6 {
        BitString::all(target.width() as u32)
            .unwrap_or_default()
            .into_iter()
            .map(|b| {
                let count = counts.get(b.as_str());
                (String::from(b), count)
            })
            .collect()
    } else {
        counts
            .sorted()
            .into_iter()
            .take(16)
            .map(|(b, c)| (b.clone(), *c))
            .collect()
    };

    for (bitstring, count) in &rows {
        let prob = *count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);
        let marker = if bitstring == target.as_str() { "◀ target" } else { "" };

        println!(
            "  {}: {:>6} ({:>5.2}%) {} {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green(),
            style(marker).yellow()
        );
    }

    if counts.len() > rows.len() {
        println!("  ... and {} more outcomes", counts.len() - rows.len());
    }
}
