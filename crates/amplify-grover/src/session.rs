//! Backend sessions.
//!
//! A [`BackendSession`] is opened once per batch: it checks that the backend
//! accepts jobs, is shared by every row, and is closed when the batch ends.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{info, instrument};

use amplify_hal::{Backend, Counts, HalError};
use amplify_ir::Circuit;

use crate::bitstring::BitString;
use crate::error::GroverResult;
use crate::estimator::{PollSchedule, sample_counts, success_probability};

/// An open connection to an execution backend.
pub struct BackendSession {
    backend: Arc<dyn Backend>,
    schedule: PollSchedule,
    jobs: AtomicU64,
}

impl BackendSession {
    /// Open a session, failing when the backend is not accepting jobs.
    #[instrument(skip(backend), fields(backend = backend.name()))]
    pub async fn open(backend: Arc<dyn Backend>) -> GroverResult<Self> {
        let availability = backend.availability().await?;
        if !availability.is_available {
            let reason = availability
                .status_message
                .unwrap_or_else(|| "no reason given".into());
            let msg = format!("{}: {reason}", backend.name());
            return Err(HalError::BackendUnavailable(msg).into());
        }

        info!(queue_depth = ?availability.queue_depth, "session opened");
        Ok(Self {
            backend,
            schedule: PollSchedule::default(),
            jobs: AtomicU64::new(0),
        })
    }

    /// Set the pause between job status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.schedule.interval = interval;
        self
    }

    /// Limit how long a single job may take.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.schedule.timeout = timeout;
        self
    }

    /// Pause between job status polls.
    pub fn poll_interval(&self) -> Duration {
        self.schedule.interval
    }

    /// The underlying backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Widest circuit the backend accepts.
    pub fn max_qubits(&self) -> u32 {
        self.backend.capabilities().num_qubits
    }

    /// Jobs run through this session so far.
    pub fn jobs_run(&self) -> u64 {
        self.jobs.load(Ordering::Relaxed)
    }

    /// Measure `circuit` and return counts keyed like `target`.
    pub async fn sample(
        &self,
        circuit: &Circuit,
        target: &BitString,
        shots: u32,
    ) -> GroverResult<Counts> {
        self.jobs.fetch_add(1, Ordering::Relaxed);
        sample_counts(circuit, target, shots, self.backend(), self.schedule).await
    }

    /// Estimate the probability of measuring `target`.
    pub async fn estimate_success(
        &self,
        circuit: &Circuit,
        target: &BitString,
        shots: u32,
    ) -> GroverResult<f64> {
        let counts = self.sample(circuit, target, shots).await?;
        Ok(success_probability(&counts, target, shots))
    }

    /// Close the session, returning the number of jobs it ran.
    pub fn close(self) -> u64 {
        let jobs = self.jobs_run();
        info!(backend = self.backend.name(), jobs, "session closed");
        jobs
    }
}

impl std::fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSession")
            .field("backend", &self.backend.name())
            .field("schedule", &self.schedule)
            .field("jobs", &self.jobs_run())
            .finish()
    }
}
