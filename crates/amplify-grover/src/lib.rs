//! Amplify Grover Engine
//!
//! Builds Grover search circuits, runs them on an execution backend and
//! measures how often the hidden target is recovered.
//!
//! # Pipeline
//!
//! ```text
//!   random_target ──→ build_oracle ──→ build_grover_circuit ──→ estimate_success
//!                                        (uses build_diffusion)      (backend)
//! ```
//!
//! [`BatchDriver`] runs that pipeline for every (qubits, threshold) row of a
//! table and writes the measured probabilities back in row order.
//!
//! # Stopping rule
//!
//! After the uniform superposition, up to ⌊3/P⌋ (oracle, diffusion) rounds
//! are appended. Before each round a coin that succeeds with probability P
//! is drawn; the first failure ends the schedule. With P = 1 the schedule
//! always has exactly three rounds.
//!
//! # Bit order
//!
//! Bit-strings are written with qubit 0 as the rightmost character, matching
//! the backend's count keys.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use amplify_adapter_sim::SimulatorBackend;
//! use amplify_grover::{BackendSession, run_pipeline};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = BackendSession::open(Arc::new(SimulatorBackend::new())).await?;
//!     let mut rng = StdRng::seed_from_u64(1);
//!     let report = run_pipeline(&session, 4, 1.0, 1000, &mut rng).await?;
//!     println!("{} found with p = {:.3}", report.target, report.probability);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod bitstring;
pub mod config;
pub mod diffusion;
pub mod error;
pub mod estimator;
pub mod iterator;
pub mod oracle;
pub mod session;
pub mod table;

pub use batch::{BatchDriver, BatchReport, RunReport, run_pipeline};
pub use bitstring::{BitString, random_target};
pub use config::{AmplifyConfig, FailurePolicy};
pub use diffusion::build_diffusion;
pub use error::{GroverError, GroverResult};
pub use estimator::{PollSchedule, estimate_success, success_probability};
pub use iterator::{
    GroverCircuit, build_grover_circuit, build_grover_with_iterations, max_iterations,
    optimal_iterations, validate_threshold,
};
pub use oracle::build_oracle;
pub use session::BackendSession;
pub use table::{FileTable, InputRow, MemoryTable, ResultRow, TableFormat, TableSink, TableSource};
