//! Success estimation from repeated sampling.

use std::time::Duration;

use tracing::{debug, warn};

use amplify_hal::{Backend, Counts, DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL};
use amplify_ir::Circuit;

use crate::bitstring::BitString;
use crate::error::{GroverError, GroverResult};

/// How a job is awaited once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Pause between status polls.
    pub interval: Duration,
    /// Polls before the backend reports a timeout.
    pub max_polls: u32,
    /// Wall-clock limit for the whole job; the job is cancelled when hit.
    pub timeout: Option<Duration>,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
            timeout: None,
        }
    }
}

/// Estimate how often `circuit` measures to `target`.
///
/// Measures every qubit, runs `shots` trials on `backend` and returns
/// `count[target] / shots` (0 when the target never appears).
pub async fn estimate_success(
    circuit: &Circuit,
    target: &BitString,
    shots: u32,
    backend: &dyn Backend,
) -> GroverResult<f64> {
    let counts = sample_counts(circuit, target, shots, backend, PollSchedule::default()).await?;
    Ok(success_probability(&counts, target, shots))
}

/// Fraction of `shots` that landed on `target`.
pub fn success_probability(counts: &Counts, target: &BitString, shots: u32) -> f64 {
    if shots == 0 {
        return 0.0;
    }
    counts.get(target.as_str()) as f64 / f64::from(shots)
}

/// Measure, submit and wait; returns counts that sum to `shots`.
pub(crate) async fn sample_counts(
    circuit: &Circuit,
    target: &BitString,
    shots: u32,
    backend: &dyn Backend,
    schedule: PollSchedule,
) -> GroverResult<Counts> {
    if shots == 0 {
        return Err(GroverError::InvalidConfiguration(
            "shots must be at least 1".into(),
        ));
    }
    if target.width() != circuit.num_qubits() {
        return Err(GroverError::InvalidConfiguration(format!(
            "target '{target}' has {} bits but circuit has {} qubits",
            target.width(),
            circuit.num_qubits()
        )));
    }
    if circuit.has_measurements() {
        return Err(GroverError::InvalidConfiguration(format!(
            "circuit '{}' is already measured",
            circuit.name()
        )));
    }

    let mut measured = circuit.clone();
    measured.measure_all()?;

    let job_id = backend.submit(&measured, shots).await?;
    debug!(backend = backend.name(), job = %job_id, shots, "submitted job");

    let wait = backend.wait_with(&job_id, schedule.interval, schedule.max_polls);
    let result = match schedule.timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(result) => result?,
            Err(_) => {
                if let Err(e) = backend.cancel(&job_id).await {
                    warn!(job = %job_id, "failed to cancel timed-out job: {e}");
                }
                return Err(GroverError::BackendFailure(format!(
                    "job {job_id} did not finish within {limit:?}"
                )));
            }
        },
        None => wait.await?,
    };

    let total = result.counts.total_shots();
    if total != u64::from(shots) {
        return Err(GroverError::BackendFailure(format!(
            "job {job_id} returned {total} outcomes for {shots} shots"
        )));
    }
    Ok(result.counts)
}
