//! Amplify Local Statevector Simulator
//!
//! A local backend for the Grover engine and its tests. The unitary part of
//! a circuit is simulated once as a full statevector; measurement outcomes
//! are then drawn from the final distribution, so a thousand shots cost
//! little more than one.
//!
//! # Features
//!
//! - **Exact amplitudes**: full statevector representation
//! - **Native multi-controlled Z**: `mcz` runs as a single phase pass
//! - **Reproducible sampling**: [`SimulatorBackend::with_seed`]
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//!
//! # Example
//!
//! ```ignore
//! use amplify_adapter_sim::SimulatorBackend;
//! use amplify_hal::Backend;
//! use amplify_ir::{Circuit, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::with_seed(7);
//!
//!     let mut circuit = Circuit::with_size("bell", 2, 0);
//!     circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?.measure_all()?;
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // Expect ~50% "00" and ~50% "11"
//!     println!("Results: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{DEFAULT_MAX_QUBITS, SimulatorBackend};
pub use statevector::Statevector;
