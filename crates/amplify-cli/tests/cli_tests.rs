//! CLI command parsing and end-to-end tests.
//!
//! Argument parsing is tested via clap `try_parse_from` on structs that
//! mirror the binary's; the commands themselves are exercised by running the
//! built `amplify` binary.

// ============================================================================
// Clap argument parsing (test via try_parse_from on equivalent structs)
// ============================================================================

mod clap_parsing {
    use clap::{Parser, Subcommand};

    #[derive(Parser)]
    #[command(name = "amplify")]
    struct TestCli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Subcommand)]
    enum TestCommands {
        Batch {
            #[arg(short, long)]
            input: String,
            #[arg(short, long)]
            output: String,
            #[arg(short, long)]
            config: Option<String>,
            #[arg(short, long)]
            shots: Option<u32>,
            #[arg(long)]
            seed: Option<u64>,
            #[arg(long)]
            concurrency: Option<usize>,
            #[arg(long)]
            max_retries: Option<u32>,
            #[arg(long)]
            failure_policy: Option<amplify_grover::FailurePolicy>,
            #[arg(long)]
            timeout: Option<u64>,
        },
        Run {
            #[arg(short = 'n', long)]
            qubits: u32,
            #[arg(short = 'p', long, default_value = "1.0")]
            threshold: f64,
            #[arg(short, long)]
            target: Option<String>,
            #[arg(long)]
            iterations: Option<u32>,
            #[arg(short, long)]
            config: Option<String>,
            #[arg(short, long)]
            shots: Option<u32>,
            #[arg(long)]
            seed: Option<u64>,
            #[arg(long)]
            timeout: Option<u64>,
        },
        Version,
    }

    #[test]
    fn test_parse_batch_minimal() {
        let cli =
            TestCli::try_parse_from(["amplify", "batch", "-i", "rows.yaml", "-o", "out.json"])
                .unwrap();
        match cli.command {
            TestCommands::Batch {
                input,
                output,
                shots,
                failure_policy,
                ..
            } => {
                assert_eq!(input, "rows.yaml");
                assert_eq!(output, "out.json");
                assert!(shots.is_none());
                assert!(failure_policy.is_none());
            }
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_parse_batch_with_all_args() {
        let cli = TestCli::try_parse_from([
            "amplify",
            "batch",
            "-i",
            "rows.json",
            "-o",
            "out.yaml",
            "-c",
            "amplify.yaml",
            "-s",
            "2048",
            "--seed",
            "42",
            "--concurrency",
            "4",
            "--max-retries",
            "5",
            "--failure-policy",
            "abort",
            "--timeout",
            "60",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Batch {
                config,
                shots,
                seed,
                concurrency,
                max_retries,
                failure_policy,
                timeout,
                ..
            } => {
                assert_eq!(config.as_deref(), Some("amplify.yaml"));
                assert_eq!(shots, Some(2048));
                assert_eq!(seed, Some(42));
                assert_eq!(concurrency, Some(4));
                assert_eq!(max_retries, Some(5));
                assert_eq!(failure_policy, Some(amplify_grover::FailurePolicy::Abort));
                assert_eq!(timeout, Some(60));
            }
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_parse_batch_bad_policy() {
        let result = TestCli::try_parse_from([
            "amplify",
            "batch",
            "-i",
            "a.json",
            "-o",
            "b.json",
            "--failure-policy",
            "ignore",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_batch_missing_output() {
        let result = TestCli::try_parse_from(["amplify", "batch", "-i", "rows.yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = TestCli::try_parse_from(["amplify", "run", "-n", "3"]).unwrap();
        match cli.command {
            TestCommands::Run {
                qubits,
                threshold,
                target,
                iterations,
                config,
                shots,
                seed,
                timeout,
            } => {
                assert_eq!(qubits, 3);
                assert_eq!(threshold, 1.0);
                assert!(target.is_none());
                assert!(iterations.is_none());
                assert!(config.is_none());
                assert!(shots.is_none());
                assert!(seed.is_none());
                assert!(timeout.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_with_target() {
        let cli = TestCli::try_parse_from([
            "amplify",
            "run",
            "-n",
            "4",
            "-p",
            "0.25",
            "--target",
            "1010",
            "--iterations",
            "3",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Run {
                threshold,
                target,
                iterations,
                ..
            } => {
                assert_eq!(threshold, 0.25);
                assert_eq!(target.as_deref(), Some("1010"));
                assert_eq!(iterations, Some(3));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_missing_qubits() {
        assert!(TestCli::try_parse_from(["amplify", "run"]).is_err());
    }

    #[test]
    fn test_parse_verbose_flag() {
        let cli = TestCli::try_parse_from(["amplify", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, TestCommands::Version));
    }

    #[test]
    fn test_no_subcommand() {
        assert!(TestCli::try_parse_from(["amplify"]).is_err());
    }
}

// ============================================================================
// End-to-end runs of the binary
// ============================================================================

mod binary {
    use std::process::{Command, Output};

    fn amplify(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_amplify"))
            .args(args)
            .env("HOME", std::env::temp_dir())
            .env_remove("AMPLIFY_SHOTS")
            .output()
            .unwrap()
    }

    #[test]
    fn test_version() {
        let output = amplify(&["version"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_run_single_round_finds_target() {
        let output = amplify(&[
            "run",
            "-n",
            "2",
            "--target",
            "10",
            "--iterations",
            "1",
            "--seed",
            "1",
        ]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Success probability: 1.0000"), "{stdout}");
    }

    #[test]
    fn test_run_reads_shots_from_environment() {
        let output = Command::new(env!("CARGO_BIN_EXE_amplify"))
            .args(["run", "-n", "2", "--target", "01", "--iterations", "1"])
            .env("HOME", std::env::temp_dir())
            .env("AMPLIFY_SHOTS", "250")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Results (250 shots)"), "{stdout}");
    }

    #[test]
    fn test_run_reads_config_file_and_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("amplify.yaml");
        std::fs::write(&config, "shots: 300\nseed: 4\n").unwrap();
        let config = config.to_str().unwrap();

        let output = amplify(&["run", "-n", "2", "--iterations", "1", "-c", config]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Results (300 shots)"), "{stdout}");

        let output = amplify(&["run", "-n", "2", "--iterations", "1", "-c", config, "-s", "40"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Results (40 shots)"), "{stdout}");
    }

    #[test]
    fn test_run_rejects_bad_threshold() {
        let output = amplify(&["run", "-n", "2", "-p", "0"]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Error:"), "{stderr}");
    }

    #[test]
    fn test_batch_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.json");
        let output = dir.path().join("results.json");
        std::fs::write(
            &input,
            r#"[{"qubits": 3, "probability": 1.0}, {"qubits": 2, "probability": 2.0}]"#,
        )
        .unwrap();

        let result = amplify(&[
            "batch",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--shots",
            "100",
            "--seed",
            "9",
        ]);
        assert!(
            result.status.success(),
            "{}",
            String::from_utf8_lossy(&result.stderr)
        );

        let rows: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["qubits"], 3);
        assert!(rows[0]["probability"].as_f64().unwrap() > 0.0);
        assert!(rows[1]["probability"].is_null());
    }

    #[test]
    fn test_batch_missing_config_fails() {
        let output = amplify(&[
            "batch",
            "-i",
            "rows.json",
            "-o",
            "out.json",
            "--config",
            "/nonexistent/amplify.yaml",
        ]);
        assert!(!output.status.success());
    }
}
