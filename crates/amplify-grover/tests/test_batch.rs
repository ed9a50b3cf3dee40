//! Batch driver behavior: ordering, reproducibility, retries and failure policy.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use amplify_adapter_sim::SimulatorBackend;
use amplify_grover::{
    AmplifyConfig, BackendSession, BatchDriver, FailurePolicy, FileTable, GroverError, InputRow,
    MemoryTable, ResultRow, TableSource, run_pipeline,
};
use amplify_hal::{
    Backend, BackendAvailability, Capabilities, Counts, ExecutionResult, HalError, HalResult,
    JobId, JobStatus, ValidationResult,
};
use amplify_ir::Circuit;
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

async fn sim_session(seed: u64) -> BackendSession {
    BackendSession::open(Arc::new(SimulatorBackend::with_seed(seed)))
        .await
        .unwrap()
}

fn config() -> AmplifyConfig {
    AmplifyConfig {
        shots: 200,
        ..AmplifyConfig::default()
    }
}

// ----------------------------------------------------------------------------
// Test backends
// ----------------------------------------------------------------------------

/// Fails the first `failures` submissions, then delegates to the simulator.
struct FlakyBackend {
    inner: SimulatorBackend,
    failures: AtomicU32,
    submits: AtomicU32,
}

impl FlakyBackend {
    fn new(failures: u32) -> Self {
        Self {
            inner: SimulatorBackend::with_seed(1),
            failures: AtomicU32::new(failures),
            submits: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        self.inner.validate(circuit).await
    }

    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(HalError::SubmissionFailed("transient".into()));
        }
        self.inner.submit(circuit, shots).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.inner.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.inner.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.inner.cancel(job_id).await
    }
}

/// Jobs that never finish, or finish with too few counts.
struct BrokenBackend {
    caps: Capabilities,
    available: bool,
    stuck: bool,
    cancelled: Mutex<Vec<JobId>>,
}

impl BrokenBackend {
    fn new(available: bool, stuck: bool) -> Self {
        Self {
            caps: Capabilities::simulator(8),
            available,
            stuck,
            cancelled: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl Backend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        if self.available {
            Ok(BackendAvailability::always_available())
        } else {
            Ok(BackendAvailability::unavailable("maintenance"))
        }
    }

    async fn validate(&self, _circuit: &Circuit) -> HalResult<ValidationResult> {
        Ok(ValidationResult::Valid)
    }

    async fn submit(&self, _circuit: &Circuit, _shots: u32) -> HalResult<JobId> {
        Ok(JobId::new("broken-1"))
    }

    async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
        if self.stuck {
            Ok(JobStatus::Running)
        } else {
            Ok(JobStatus::Completed)
        }
    }

    async fn result(&self, _job_id: &JobId) -> HalResult<ExecutionResult> {
        let counts: Counts = [("00".to_string(), 3)].into_iter().collect();
        Ok(ExecutionResult::new(counts, 3))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.cancelled.lock().unwrap().push(job_id.clone());
        Ok(())
    }
}

/// Delegates to the simulator after a delay that shrinks with circuit width,
/// so narrow rows finish after wide ones started later.
struct SlowBackend {
    inner: SimulatorBackend,
    finished: Mutex<Vec<u32>>,
}

impl SlowBackend {
    fn new(seed: u64) -> Self {
        Self {
            inner: SimulatorBackend::with_seed(seed),
            finished: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl Backend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        self.inner.validate(circuit).await
    }

    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        let n = circuit.num_qubits() as u32;
        tokio::time::sleep(Duration::from_millis(100 * u64::from(6 - n))).await;
        self.finished.lock().unwrap().push(n);
        self.inner.submit(circuit, shots).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.inner.status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.inner.result(job_id).await
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.inner.cancel(job_id).await
    }
}

// ----------------------------------------------------------------------------
// Pipeline
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_run_pipeline_report() {
    let session = sim_session(10).await;
    let mut rng = StdRng::seed_from_u64(10);

    let report = run_pipeline(&session, 4, 1.0, 500, &mut rng).await.unwrap();
    assert_eq!(report.qubits, 4);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.target.width(), 4);
    assert_eq!(report.counts.total_shots(), 500);
    assert!(report.probability > 0.85, "p = {}", report.probability);
}

#[tokio::test]
async fn test_run_pipeline_rejects_bad_rows() {
    let session = sim_session(0).await;
    let mut rng = StdRng::seed_from_u64(0);

    for (n, p) in [(0, 0.5), (3, 0.0), (3, -0.2), (3, 1.5), (3, f64::NAN), (64, 1.0)] {
        let err = run_pipeline(&session, n, p, 100, &mut rng).await.unwrap_err();
        assert!(
            matches!(err, GroverError::InvalidConfiguration(_)),
            "({n}, {p}) gave {err}"
        );
    }
    assert_eq!(session.jobs_run(), 0);
}

// ----------------------------------------------------------------------------
// Batch driver
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_rows_come_back_in_input_order() {
    let rows = vec![
        InputRow::new(4, 1.0),
        InputRow::new(2, 0.5),
        InputRow::new(3, 0.25),
        InputRow::new(1, 1.0),
        InputRow::new(5, 0.75),
    ];
    let driver = BatchDriver::new(
        sim_session(2).await,
        &AmplifyConfig {
            concurrency: 3,
            ..config()
        },
    );

    let report = driver
        .run(&rows, &mut StdRng::seed_from_u64(2))
        .await
        .unwrap();
    assert_eq!(report.rows.len(), rows.len());
    assert_eq!(report.skipped, 0);
    for (input, output) in rows.iter().zip(&report.rows) {
        assert_eq!(output.qubits, input.qubits);
        assert_eq!(output.threshold, input.threshold);
        let p = output.probability.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }
}

#[tokio::test]
async fn test_same_seed_same_results() {
    let rows = vec![InputRow::new(3, 0.5), InputRow::new(4, 0.3), InputRow::new(2, 1.0)];

    let run = |seed: u64| {
        let rows = rows.clone();
        async move {
            let driver = BatchDriver::new(sim_session(seed).await, &config());
            driver
                .run(&rows, &mut StdRng::seed_from_u64(seed))
                .await
                .unwrap()
                .rows
        }
    };

    assert_eq!(run(21).await, run(21).await);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_completion_keeps_input_order() {
    let backend = Arc::new(SlowBackend::new(3));
    let session = BackendSession::open(backend.clone()).await.unwrap();
    let driver = BatchDriver::new(
        session,
        &AmplifyConfig {
            concurrency: 4,
            ..config()
        },
    );

    let rows: Vec<InputRow> = (1..=5).map(|n| InputRow::new(n, 1.0)).collect();
    let report = driver
        .run(&rows, &mut StdRng::seed_from_u64(3))
        .await
        .unwrap();

    let finished = backend.finished.lock().unwrap().clone();
    assert_ne!(finished, vec![1, 2, 3, 4, 5], "rows finished in input order");
    let order: Vec<u32> = report.rows.iter().map(|r| r.qubits).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_same_seed_same_results_at_any_concurrency() {
    let rows = vec![
        InputRow::new(3, 0.5),
        InputRow::new(4, 0.3),
        InputRow::new(2, 1.0),
        InputRow::new(5, 0.75),
        InputRow::new(1, 0.5),
    ];

    let run = |concurrency: usize| {
        let rows = rows.clone();
        async move {
            let driver = BatchDriver::new(
                sim_session(9).await,
                &AmplifyConfig {
                    concurrency,
                    ..config()
                },
            );
            driver
                .run(&rows, &mut StdRng::seed_from_u64(9))
                .await
                .unwrap()
                .rows
        }
    };

    assert_eq!(run(1).await, run(4).await);
}

#[tokio::test]
async fn test_different_seeds_are_statistically_consistent() {
    // P = 1 fixes the schedule, so only the target and sampling noise vary.
    let rows = vec![InputRow::new(4, 1.0); 4];
    let mut means = vec![];
    for seed in [31, 32] {
        let driver = BatchDriver::new(sim_session(seed).await, &config());
        let report = driver
            .run(&rows, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        let total: f64 = report.rows.iter().filter_map(|r| r.probability).sum();
        means.push(total / rows.len() as f64);
    }
    assert!((means[0] - means[1]).abs() < 0.05, "means = {means:?}");
}

#[tokio::test]
async fn test_invalid_row_is_skipped_without_retry() {
    let backend = Arc::new(FlakyBackend::new(0));
    let session = BackendSession::open(backend.clone()).await.unwrap();
    let driver = BatchDriver::new(session, &config());

    let rows = vec![InputRow::new(2, 1.0), InputRow::new(2, 0.0), InputRow::new(3, 1.0)];
    let report = driver
        .run(&rows, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.completed(), 2);
    assert_eq!(report.rows[1], ResultRow::skipped(rows[1]));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let backend = Arc::new(FlakyBackend::new(2));
    let session = BackendSession::open(backend.clone()).await.unwrap();
    let driver = BatchDriver::new(session, &config());

    let report = driver
        .run(&[InputRow::new(2, 1.0)], &mut StdRng::seed_from_u64(6))
        .await
        .unwrap();

    assert_eq!(report.skipped, 0);
    assert_eq!(backend.submits.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retries_wait_one_poll_interval() {
    let backend = Arc::new(FlakyBackend::new(2));
    let session = BackendSession::open(backend.clone())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(200));
    let driver = BatchDriver::new(session, &config());

    let start = tokio::time::Instant::now();
    let report = driver
        .run(&[InputRow::new(2, 1.0)], &mut StdRng::seed_from_u64(6))
        .await
        .unwrap();

    assert_eq!(report.skipped, 0);
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_skip_row() {
    let backend = Arc::new(FlakyBackend::new(10));
    let session = BackendSession::open(backend.clone()).await.unwrap();
    let driver = BatchDriver::new(
        session,
        &AmplifyConfig {
            max_retries: 1,
            ..config()
        },
    );

    let report = driver
        .run(
            &[InputRow::new(2, 1.0), InputRow::new(2, 1.0)],
            &mut StdRng::seed_from_u64(7),
        )
        .await
        .unwrap();

    assert_eq!(report.skipped, 2);
    // Two attempts per row.
    assert_eq!(backend.submits.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_abort_policy_stops_batch() {
    let backend = Arc::new(FlakyBackend::new(10));
    let session = BackendSession::open(backend.clone()).await.unwrap();
    let driver = BatchDriver::new(
        session,
        &AmplifyConfig {
            max_retries: 0,
            failure_policy: FailurePolicy::Abort,
            ..config()
        },
    );

    let err = driver
        .run(
            &[InputRow::new(2, 1.0), InputRow::new(3, 1.0)],
            &mut StdRng::seed_from_u64(8),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GroverError::BackendFailure(_)));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unavailable_backend_fails_to_open() {
    let err = BackendSession::open(Arc::new(BrokenBackend::new(false, false)))
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        GroverError::BackendFailure(msg)
            if msg.contains("Backend not available") && msg.contains("maintenance")
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_counts_are_backend_failures() {
    let session = BackendSession::open(Arc::new(BrokenBackend::new(true, false)))
        .await
        .unwrap();
    let err = run_pipeline(&session, 2, 1.0, 100, &mut StdRng::seed_from_u64(9))
        .await
        .unwrap_err();
    assert!(matches!(err, GroverError::BackendFailure(msg) if msg.contains("3 outcomes")));
}

#[tokio::test(start_paused = true)]
async fn test_stuck_job_times_out_and_is_cancelled() {
    let backend = Arc::new(BrokenBackend::new(true, true));
    let session = BackendSession::open(backend.clone())
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(50))
        .with_timeout(Some(Duration::from_secs(2)));

    let err = run_pipeline(&session, 2, 1.0, 100, &mut StdRng::seed_from_u64(9))
        .await
        .unwrap_err();
    assert!(matches!(err, GroverError::BackendFailure(_)));
    assert!(err.is_retryable());
    assert_eq!(backend.cancelled.lock().unwrap().len(), 1);
}

// ----------------------------------------------------------------------------
// Tables
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_run_table_with_memory_table() {
    let mut table = MemoryTable::new(vec![InputRow::new(2, 1.0), InputRow::new(3, 0.5)]);
    let mut sink = MemoryTable::default();
    let driver = BatchDriver::new(sim_session(12).await, &config());

    let report = driver
        .run_table(&mut table, &mut sink, &mut StdRng::seed_from_u64(12))
        .await
        .unwrap();
    assert_eq!(sink.results(), report.rows.as_slice());
    assert_eq!(driver.close(), 2);
}

#[tokio::test]
async fn test_run_table_with_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rows.yaml");
    let output = dir.path().join("results.json");
    std::fs::write(
        &input,
        "- qubits: 2\n  probability: 1.0\n- qubits: 0\n  probability: 0.5\n",
    )
    .unwrap();

    let mut table = FileTable::new(&input, &output);
    let mut sink = table.clone();
    let driver = BatchDriver::new(sim_session(13).await, &config());
    let report = driver
        .run_table(&mut table, &mut sink, &mut StdRng::seed_from_u64(13))
        .await
        .unwrap();
    assert_eq!(report.skipped, 1);

    let written: Vec<ResultRow> =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, report.rows);
    assert_eq!(written[1].probability, None);

    // The input side is untouched.
    assert_eq!(table.read_rows().unwrap().len(), 2);
}
