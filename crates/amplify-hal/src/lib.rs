//! Amplify Hardware Abstraction Layer
//!
//! This crate provides the interface the Grover engine uses to execute
//! circuits: submit a circuit with a shot count, follow the job, and read
//! back measurement counts.
//!
//! # Overview
//!
//! - A common [`Backend`] trait for job submission and management
//! - [`Capabilities`] to describe qubit limits and supported gates
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! Backends with job-style semantics (submit → poll → fetch) and local
//! simulators that finish on submit share the same interface; callers use
//! [`Backend::wait`] and never see the difference.
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use amplify_hal::Backend;
//! use amplify_adapter_sim::SimulatorBackend;
//! use amplify_ir::{Circuit, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut circuit = Circuit::with_size("coin", 1, 0);
//!     circuit.h(QubitId(0))?.measure_all()?;
//!
//!     let backend = SimulatorBackend::new();
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     if let Some((bitstring, count)) = result.counts.most_frequent() {
//!         println!("Most frequent: {} ({} times)", bitstring, count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, DEFAULT_MAX_POLLS,
    DEFAULT_POLL_INTERVAL, ValidationResult,
};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
