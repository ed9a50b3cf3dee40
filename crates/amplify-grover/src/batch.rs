//! The batch driver.
//!
//! Each input row runs the full pipeline: draw a target, build its oracle,
//! build a Grover circuit with the randomized schedule, then estimate how
//! often the target is measured. Rows are independent and may run
//! concurrently; results always come back in input order.
//!
//! Every row gets its own generator, seeded from the batch generator before
//! any row starts, so a seeded batch is reproducible at any concurrency.

use futures::stream::{self, StreamExt, TryStreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use amplify_hal::Counts;

use crate::bitstring::{BitString, random_target};
use crate::config::{AmplifyConfig, FailurePolicy};
use crate::error::{GroverError, GroverResult};
use crate::estimator::success_probability;
use crate::iterator::{GroverCircuit, build_grover_circuit, validate_threshold};
use crate::oracle::build_oracle;
use crate::session::BackendSession;
use crate::table::{InputRow, ResultRow, TableSink, TableSource};

/// Everything observed while running one row.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of qubits.
    pub qubits: u32,
    /// Threshold the schedule was drawn with.
    pub threshold: f64,
    /// The hidden target.
    pub target: BitString,
    /// Rounds the schedule appended.
    pub iterations: u32,
    /// Measured frequency of the target.
    pub probability: f64,
    /// Raw outcome counts.
    pub counts: Counts,
}

/// A row whose circuit is built but not yet sampled.
#[derive(Debug, Clone)]
struct PreparedRow {
    target: BitString,
    grover: GroverCircuit,
}

fn prepare_row<R: Rng + ?Sized>(
    session: &BackendSession,
    n: u32,
    p: f64,
    rng: &mut R,
) -> GroverResult<PreparedRow> {
    if n == 0 {
        return Err(GroverError::InvalidConfiguration(
            "number of qubits must be at least 1".into(),
        ));
    }
    if n > session.max_qubits() {
        return Err(GroverError::InvalidConfiguration(format!(
            "{n} qubits exceeds backend limit of {}",
            session.max_qubits()
        )));
    }
    validate_threshold(p)?;

    let target = random_target(n, rng)?;
    let oracle = build_oracle(n, std::slice::from_ref(&target))?;
    let grover = build_grover_circuit(n, p, &oracle, rng)?;
    Ok(PreparedRow { target, grover })
}

/// Run one (n, P) configuration end to end.
#[instrument(skip(session, rng))]
pub async fn run_pipeline<R: Rng + ?Sized>(
    session: &BackendSession,
    n: u32,
    p: f64,
    shots: u32,
    rng: &mut R,
) -> GroverResult<RunReport> {
    let prepared = prepare_row(session, n, p, rng)?;
    sample_prepared(session, n, p, shots, prepared).await
}

async fn sample_prepared(
    session: &BackendSession,
    n: u32,
    p: f64,
    shots: u32,
    prepared: PreparedRow,
) -> GroverResult<RunReport> {
    let PreparedRow { target, grover } = prepared;
    let counts = session.sample(&grover.circuit, &target, shots).await?;
    let probability = success_probability(&counts, &target, shots);

    debug!(
        n,
        p,
        bits = %target,
        iterations = grover.iterations,
        probability,
        "row finished"
    );
    Ok(RunReport {
        qubits: n,
        threshold: p,
        target,
        iterations: grover.iterations,
        probability,
        counts,
    })
}

/// Summary of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One result per input row, in input order.
    pub rows: Vec<ResultRow>,
    /// Rows recorded without a probability.
    pub skipped: usize,
}

impl BatchReport {
    /// Rows that produced a probability.
    pub fn completed(&self) -> usize {
        self.rows.len() - self.skipped
    }
}

/// Runs batches of rows against one backend session.
#[derive(Debug)]
pub struct BatchDriver {
    session: BackendSession,
    shots: u32,
    concurrency: usize,
    max_retries: u32,
    failure_policy: FailurePolicy,
}

impl BatchDriver {
    /// Create a driver using the batch settings from `config`.
    pub fn new(session: BackendSession, config: &AmplifyConfig) -> Self {
        Self {
            session,
            shots: config.shots,
            concurrency: config.concurrency.max(1),
            max_retries: config.max_retries,
            failure_policy: config.failure_policy,
        }
    }

    /// The session rows run on.
    pub fn session(&self) -> &BackendSession {
        &self.session
    }

    /// Run `rows`, returning one result per row in input order.
    ///
    /// Under [`FailurePolicy::Abort`] the first row that fails after its
    /// retries ends the batch with that row's error.
    #[instrument(skip_all, fields(rows = rows.len(), concurrency = self.concurrency))]
    pub async fn run<R: Rng + ?Sized>(
        &self,
        rows: &[InputRow],
        rng: &mut R,
    ) -> GroverResult<BatchReport> {
        let seeds: Vec<u64> = rows.iter().map(|_| rng.r#gen()).collect();

        let results: Vec<ResultRow> = stream::iter(rows.iter().copied().zip(seeds).enumerate())
            .map(|(index, (row, seed))| self.run_row(index, row, seed))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let skipped = results.iter().filter(|r| r.probability.is_none()).count();
        info!(rows = results.len(), skipped, "batch finished");
        Ok(BatchReport {
            rows: results,
            skipped,
        })
    }

    /// Read every row from `source`, run them and write the results to `sink`.
    pub async fn run_table<R: Rng + ?Sized>(
        &self,
        source: &mut dyn TableSource,
        sink: &mut dyn TableSink,
        rng: &mut R,
    ) -> GroverResult<BatchReport> {
        let rows = source.read_rows()?;
        let report = self.run(&rows, rng).await?;
        sink.write_rows(&report.rows)?;
        Ok(report)
    }

    async fn run_row(&self, index: usize, row: InputRow, seed: u64) -> GroverResult<ResultRow> {
        let mut rng = StdRng::seed_from_u64(seed);
        match self.attempt_row(row, &mut rng).await {
            Ok(report) => {
                info!(
                    row = index,
                    qubits = row.qubits,
                    threshold = row.threshold,
                    iterations = report.iterations,
                    probability = report.probability,
                    "row completed"
                );
                Ok(ResultRow::completed(row, report.probability))
            }
            Err(e) => match self.failure_policy {
                FailurePolicy::Skip => {
                    warn!(row = index, qubits = row.qubits, "skipping row: {e}");
                    Ok(ResultRow::skipped(row))
                }
                FailurePolicy::Abort => {
                    warn!(row = index, qubits = row.qubits, "aborting batch: {e}");
                    Err(e)
                }
            },
        }
    }

    /// Build the row once, then retry only the backend round-trip, pausing
    /// one poll interval before each new attempt.
    async fn attempt_row(&self, row: InputRow, rng: &mut StdRng) -> GroverResult<RunReport> {
        let prepared = prepare_row(&self.session, row.qubits, row.threshold, rng)?;

        let mut attempt = 0;
        loop {
            match sample_prepared(
                &self.session,
                row.qubits,
                row.threshold,
                self.shots,
                prepared.clone(),
            )
            .await
            {
                Ok(report) => return Ok(report),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        qubits = row.qubits,
                        attempt,
                        max_retries = self.max_retries,
                        "retrying row: {e}"
                    );
                    tokio::time::sleep(self.session.poll_interval()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the underlying session, returning the number of jobs run.
    pub fn close(self) -> u64 {
        self.session.close()
    }
}
