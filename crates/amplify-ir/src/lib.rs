//! Amplify Circuit Intermediate Representation
//!
//! This crate provides the data structures for representing the quantum
//! circuits built by the Grover engine: qubit identifiers, gates,
//! instructions and the [`Circuit`] builder.
//!
//! # Overview
//!
//! A [`Circuit`] is an ordered list of [`Instruction`]s over a fixed register
//! of qubits. Builder methods validate operands as instructions are appended.
//! Larger circuits are assembled with [`Circuit::compose`], which copies the
//! instructions of a sub-circuit through a qubit mapping.
//!
//! # Bit ordering
//!
//! Qubit `0` is the least significant bit. When an outcome is written as a
//! bit-string, qubit `0` is the rightmost character.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use amplify_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `CX`, `CZ` | 2 | Controlled-NOT and Controlled-Z |
//! | `CCX` | 3 | Toffoli gate |
//! | `MCZ(k)` | k + 1 | Z with k controls |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::{Circuit, DEFAULT_QREG};
pub use error::{IrError, IrResult};
pub use gate::{Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, Qubit, QubitId};
