//! Amplify Command-Line Interface
//!
//! Runs Grover searches on the local simulator, one at a time (`run`) or
//! for a whole table of (qubits, threshold) rows (`batch`).

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use amplify_grover::FailurePolicy;

mod commands;

use commands::common::ConfigOverrides;
use commands::{batch, run, version};

/// Amplify - Grover search experiments with randomized early stopping
#[derive(Parser)]
#[command(name = "amplify")]
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
    /// Run every (qubits, threshold) row of a table and record the success probability
    Batch {
        /// Input table (JSON or YAML)
        #[arg(short, long)]
        input: String,

        /// Output table (JSON or YAML)
        #[arg(short, long)]
        output: String,

        /// Configuration file (defaults to ~/.amplify/config.yaml if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Shots per row
        #[arg(short, long)]
        shots: Option<u32>,

        /// Seed for reproducible batches
        #[arg(long)]
        seed: Option<u64>,

        /// Rows in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Retries for a row whose backend call failed
        #[arg(long)]
        max_retries: Option<u32>,

        /// What to do with a row that keeps failing (skip, abort)
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,

        /// Per-job timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run a single Grover search and show the outcome distribution
    Run {
        /// Number of qubits
        #[arg(short = 'n', long)]
        qubits: u32,

        /// Success threshold P in (0, 1]
        #[arg(short = 'p', long, default_value = "1.0")]
        threshold: f64,

        /// Target bit-string (random if omitted; qubit 0 is the rightmost bit)
        #[arg(short, long)]
        target: Option<String>,

        /// Fixed number of rounds instead of the randomized schedule
        #[arg(long)]
        iterations: Option<u32>,

        /// Configuration file (defaults to ~/.amplify/config.yaml if present)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of shots
        #[arg(short, long)]
        shots: Option<u32>,

        /// Seed for the target, schedule and sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Job timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Batch {
            input,
            output,
            config,
            shots,
            seed,
            concurrency,
            max_retries,
            failure_policy,
            timeout,
        } => {
            let overrides = ConfigOverrides {
                shots,
                seed,
                concurrency,
                max_retries,
                failure_policy,
                timeout_secs: timeout,
            };
            batch::execute(&input, &output, config.as_deref(), overrides).await
        }

        Commands::Run {
            qubits,
            threshold,
            target,
            iterations,
            config,
            shots,
            seed,
            timeout,
        } => {
            let overrides = ConfigOverrides {
                shots,
                seed,
                timeout_secs: timeout,
                ..ConfigOverrides::default()
            };
            run::execute(
                qubits,
                threshold,
                target.as_deref(),
                iterations,
                config.as_deref(),
                overrides,
            )
            .await
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
