//! Configuration for batch runs.
//!
//! Values are resolved in this order (later wins):
//! 1. Built-in defaults
//! 2. A configuration file (YAML or JSON, chosen by extension)
//! 3. `AMPLIFY_*` environment variables
//! 4. Command-line flags (applied by the caller)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GroverError, GroverResult};

/// What the batch driver does with a row that still fails after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the row without a probability and continue.
    #[default]
    Skip,
    /// Stop the batch and report the error.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Skip => write!(f, "skip"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = GroverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(FailurePolicy::Skip),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(GroverError::Config(format!(
                "unknown failure policy '{other}' (expected skip or abort)"
            ))),
        }
    }
}

/// Settings for running Grover searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifyConfig {
    /// Shots per row.
    pub shots: u32,
    /// Seed for the batch generator; entropy when absent.
    pub seed: Option<u64>,
    /// Rows in flight at once.
    pub concurrency: usize,
    /// Extra attempts for a row whose backend call failed.
    pub max_retries: u32,
    /// Handling of rows that exhaust their retries.
    pub failure_policy: FailurePolicy,
    /// Per-job wall-clock limit in seconds.
    pub timeout_secs: Option<u64>,
    /// Pause between job status polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Widest register the simulator accepts.
    pub max_qubits: u32,
}

impl Default for AmplifyConfig {
    fn default() -> Self {
        Self {
            shots: 1000,
            seed: None,
            concurrency: 1,
            max_retries: 2,
            failure_policy: FailurePolicy::Skip,
            timeout_secs: None,
            poll_interval_ms: 500,
            max_qubits: 20,
        }
    }
}

impl AmplifyConfig {
    /// Load a configuration file; `.json` is read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> GroverResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GroverError::Config(format!("failed to read {}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&contents).map_err(|e| GroverError::Config(e.to_string()))?
        } else {
            serde_yaml_ng::from_str(&contents).map_err(|e| GroverError::Config(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// `~/.amplify/config.yaml`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".amplify").join("config.yaml"))
    }

    /// Resolve defaults, the file at `path` (or the default file when it
    /// exists) and the environment.
    pub fn load(path: Option<&Path>) -> GroverResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => {
                    debug!(path = %default.display(), "using default config file");
                    Self::from_file(&default)?
                }
                None => Self::default(),
            },
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AMPLIFY_*` environment variables.
    pub fn merge_env(self) -> GroverResult<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by variable name.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> GroverResult<Self> {
        fn parse<T: FromStr>(key: &str, value: &str) -> GroverResult<T> {
            value
                .trim()
                .parse()
                .map_err(|_| GroverError::Config(format!("{key}: cannot parse '{value}'")))
        }

        if let Some(v) = lookup("AMPLIFY_SHOTS") {
            self.shots = parse("AMPLIFY_SHOTS", &v)?;
        }
        if let Some(v) = lookup("AMPLIFY_SEED") {
            self.seed = Some(parse("AMPLIFY_SEED", &v)?);
        }
        if let Some(v) = lookup("AMPLIFY_CONCURRENCY") {
            self.concurrency = parse("AMPLIFY_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("AMPLIFY_MAX_RETRIES") {
            self.max_retries = parse("AMPLIFY_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("AMPLIFY_FAILURE_POLICY") {
            self.failure_policy = v.parse()?;
        }
        if let Some(v) = lookup("AMPLIFY_TIMEOUT_SECS") {
            self.timeout_secs = Some(parse("AMPLIFY_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("AMPLIFY_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse("AMPLIFY_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("AMPLIFY_MAX_QUBITS") {
            self.max_qubits = parse("AMPLIFY_MAX_QUBITS", &v)?;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> GroverResult<()> {
        if self.shots == 0 {
            return Err(GroverError::Config("shots must be greater than 0".into()));
        }
        if self.concurrency == 0 {
            return Err(GroverError::Config(
                "concurrency must be greater than 0".into(),
            ));
        }
        if self.max_qubits == 0 {
            return Err(GroverError::Config(
                "max_qubits must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-job timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
