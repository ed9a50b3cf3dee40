//! High-level circuit builder API.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, Qubit, QubitId};

/// Name of the quantum register created by [`Circuit::with_size`].
pub const DEFAULT_QREG: &str = "q";

/// A quantum circuit.
///
/// A circuit is an ordered list of instructions over a fixed register of
/// qubits. Builder methods validate operands as they are appended, so a
/// circuit that exists is always well formed.
///
/// Composition ([`Circuit::compose`]) copies the instructions of another
/// circuit; the embedded circuit is borrowed and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit.
    qubits: Vec<Qubit>,
    /// Number of classical bits.
    num_clbits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            num_clbits: 0,
            instructions: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    ///
    /// Qubits are registered in a single register named `q`.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.qubits = (0..num_qubits)
            .map(|i| Qubit::with_register(QubitId(i), DEFAULT_QREG, i))
            .collect();
        circuit.num_clbits = num_clbits;
        circuit
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.num_clbits);
        self.num_clbits += 1;
        id
    }

    /// Append a validated instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.check(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn check(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = || Some(instruction.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name(),
                });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply a Hadamard gate to every qubit.
    pub fn h_all(&mut self) -> IrResult<&mut Self> {
        for i in 0..self.num_qubits() as u32 {
            self.h(QubitId(i))?;
        }
        Ok(self)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply a Z gate controlled on every qubit in `controls`.
    pub fn mcz(&mut self, controls: &[QubitId], target: QubitId) -> IrResult<&mut Self> {
        let num_controls = controls.len() as u32;
        let operands = controls.iter().copied().chain(std::iter::once(target));
        self.apply(Instruction::gate(StandardGate::MCZ(num_controls), operands))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure all qubits to corresponding classical bits.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        // Ensure we have enough classical bits
        while (self.num_clbits as usize) < self.qubits.len() {
            self.add_clbit();
        }

        for i in 0..self.qubits.len() as u32 {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Embed `other` into this circuit.
    ///
    /// Qubit `i` of `other` is placed on `mapping[i]`. The instructions are
    /// copied and validated against this circuit; `other` is untouched.
    pub fn compose(&mut self, other: &Circuit, mapping: &[QubitId]) -> IrResult<&mut Self> {
        if mapping.len() < other.num_qubits() {
            return Err(IrError::MappingMismatch {
                name: other.name.clone(),
                needed: other.num_qubits(),
                provided: mapping.len(),
            });
        }

        for inst in &other.instructions {
            self.apply(inst.remapped(|q| mapping[q.index()]))?;
        }
        Ok(self)
    }

    /// Embed `other` on the leading qubits of this circuit, index for index.
    pub fn append(&mut self, other: &Circuit) -> IrResult<&mut Self> {
        let mapping: Vec<_> = (0..other.num_qubits() as u32).map(QubitId).collect();
        self.compose(other, &mapping)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Check whether the circuit contains any measurement.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Count instructions by name.
    pub fn count_ops(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Get the circuit depth.
    ///
    /// Instructions on disjoint qubits share a layer.
    pub fn depth(&self) -> usize {
        let mut qubit_depth = vec![0usize; self.qubits.len()];
        let mut clbit_depth = vec![0usize; self.num_clbits as usize];
        let mut depth = 0;

        for inst in &self.instructions {
            let start = inst
                .qubits
                .iter()
                .map(|q| qubit_depth[q.index()])
                .chain(inst.clbits.iter().map(|c| clbit_depth[c.0 as usize]))
                .max()
                .unwrap_or(0);
            let layer = start + 1;
            for q in &inst.qubits {
                qubit_depth[q.index()] = layer;
            }
            for c in &inst.clbits {
                clbit_depth[c.0 as usize] = layer;
            }
            depth = depth.max(layer);
        }

        depth
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "circuit {} ({} qubits, {} ops)",
            self.name,
            self.num_qubits(),
            self.num_ops()
        )?;
        for inst in &self.instructions {
            let operands: Vec<String> = inst
                .qubits
                .iter()
                .map(|q| self.qubits[q.index()].to_string())
                .collect();
            write!(f, "  {} {}", inst.name(), operands.join(", "))?;
            if !inst.clbits.is_empty() {
                let targets: Vec<String> = inst.clbits.iter().map(ToString::to_string).collect();
                write!(f, " -> {}", targets.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
