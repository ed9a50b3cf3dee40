//! Simulator backend implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use amplify_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use amplify_ir::{Circuit, InstructionKind};

use crate::statevector::Statevector;

/// Default maximum register width.
pub const DEFAULT_MAX_QUBITS: u32 = 20;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// This backend simulates circuits with a statevector. Measurements must be
/// terminal: the unitary part runs once and the final distribution is
/// sampled `shots` times. Jobs complete during `submit` and are dropped
/// once their result has been collected.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Capabilities, fixed at construction.
    capabilities: Capabilities,
    /// Jobs whose result has not been collected yet.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Sampling generator shared by all jobs.
    rng: Mutex<StdRng>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::build(BackendConfig::new("simulator"), DEFAULT_MAX_QUBITS, None)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self::build(BackendConfig::new("simulator"), max_qubits, None)
    }

    /// Create a simulator whose sampling is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(BackendConfig::new("simulator"), DEFAULT_MAX_QUBITS, Some(seed))
    }

    fn build(config: BackendConfig, max_qubits: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut capabilities = Capabilities::simulator(max_qubits);
        capabilities.name.clone_from(&config.name);
        Self {
            config,
            capabilities,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Mutex::new(rng),
        }
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();

        debug!(
            "Starting simulation: {} qubits, {} ops, {} shots",
            circuit.num_qubits(),
            circuit.num_ops(),
            shots
        );

        let sv = Statevector::from_circuit(circuit);
        let measured = measurement_map(circuit);
        let width = circuit.num_clbits();

        let outcomes = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            sv.sample_many(shots, &mut *rng)
        };

        let mut tally: FxHashMap<usize, u64> = FxHashMap::default();
        for outcome in outcomes {
            *tally.entry(outcome).or_insert(0) += 1;
        }

        let counts: Counts = tally
            .into_iter()
            .map(|(outcome, n)| (clbit_string(outcome, &measured, width), n))
            .collect();

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64)
    }

    fn check_submission(&self, circuit: &Circuit, shots: u32) -> HalResult<()> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            )));
        }
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} (allowed 1..={})",
                self.capabilities.max_shots
            )));
        }
        let reasons = self.capabilities.violations(circuit);
        if !reasons.is_empty() {
            return Err(HalError::InvalidCircuit(reasons.join("; ")));
        }
        if !circuit.has_measurements() {
            return Err(HalError::InvalidCircuit(
                "circuit has no measurements".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Pairs of (qubit index, clbit index) for every measurement.
fn measurement_map(circuit: &Circuit) -> Vec<(usize, usize)> {
    circuit
        .instructions()
        .iter()
        .filter(|inst| matches!(inst.kind, InstructionKind::Measure))
        .flat_map(|inst| {
            inst.qubits
                .iter()
                .zip(&inst.clbits)
                .map(|(q, c)| (q.index(), c.0 as usize))
        })
        .collect()
}

/// Render the classical register for a sampled basis state, clbit 0 rightmost.
fn clbit_string(outcome: usize, measured: &[(usize, usize)], width: usize) -> String {
    let mut bits = vec![b'0'; width];
    for &(qubit, clbit) in measured {
        bits[width - 1 - clbit] = if outcome >> qubit & 1 == 1 { b'1' } else { b'0' };
    }
    bits.into_iter().map(char::from).collect()
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let reasons = self.capabilities.violations(circuit);
        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        self.check_submission(circuit, shots)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend(self.config.name.clone());

        {
            let mut jobs = self
                .jobs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    job: job.with_status(JobStatus::Running),
                    result: None,
                },
            );
        }

        debug!("Submitted job: {}", job_id);

        let result = self.run_simulation(circuit, shots);

        {
            let mut jobs = self
                .jobs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(sim_job) = jobs.get_mut(&job_id.0) {
                sim_job.result = Some(result);
                sim_job.job = sim_job.job.clone().with_status(JobStatus::Completed);
            }
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let status = jobs
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match status {
            // Terminal jobs are handed back once, then forgotten.
            JobStatus::Completed => jobs
                .remove(&job_id.0)
                .and_then(|j| j.result)
                .ok_or_else(|| {
                    HalError::Backend(format!("job {job_id} completed without a result"))
                }),
            JobStatus::Cancelled => {
                jobs.remove(&job_id.0);
                Err(HalError::JobCancelled)
            }
            status => Err(HalError::Backend(format!(
                "job {job_id} has no result (status: {status})"
            ))),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            sim_job.job = sim_job.job.clone().with_status(JobStatus::Cancelled);
            Ok(())
        } else {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits") {
            Some(v) => u32::try_from(v)
                .ok()
                .filter(|&v| (1..=30).contains(&v))
                .ok_or_else(|| HalError::Configuration(format!("max_qubits out of range: {v}")))?,
            None => DEFAULT_MAX_QUBITS,
        };
        let seed = config.extra_u64("seed");

        Ok(Self::build(config, max_qubits, seed))
    }
}
