//! Backend capability introspection.
//!
//! Describes what a backend can run: qubit count, supported gates and shot
//! limits. Backends use these in `validate()`; callers use them to size
//! experiments before submitting.

use serde::{Deserialize, Serialize};

use amplify_ir::{Circuit, InstructionKind};

/// Hardware capabilities of an execution backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (lowercase gate names).
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags such as `"statevector"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec!["statevector".into()],
        }
    }

    /// Collect the reasons `circuit` cannot run as-is. Empty means valid.
    pub fn violations(&self, circuit: &Circuit) -> Vec<String> {
        let mut reasons = vec![];

        if circuit.num_qubits() > self.num_qubits as usize {
            reasons.push(format!(
                "circuit uses {} qubits, backend supports {}",
                circuit.num_qubits(),
                self.num_qubits
            ));
        }

        let mut unsupported: Vec<&str> = circuit
            .instructions()
            .iter()
            .filter_map(|inst| match &inst.kind {
                InstructionKind::Gate(g) if !self.gate_set.contains(g.name()) => Some(g.name()),
                _ => None,
            })
            .collect();
        unsupported.sort_unstable();
        unsupported.dedup();
        for name in unsupported {
            reasons.push(format!("gate '{name}' is not supported"));
        }

        reasons
    }
}

/// Gate set supported by a backend.
///
/// If `native` is empty, all supported gates are considered native
/// (typical for simulators).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Gates acting on three or more qubits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multi_qubit: Vec<String>,
    /// Native gates (execute without decomposition on this backend).
    pub native: Vec<String>,
}

impl GateSet {
    /// Create universal gate set covering every gate in the IR.
    pub fn universal() -> Self {
        Self {
            single_qubit: ["id", "x", "y", "z", "h", "s", "sdg", "t", "tdg"]
                .map(String::from)
                .to_vec(),
            two_qubit: ["cx", "cz"].map(String::from).to_vec(),
            multi_qubit: ["ccx", "mcz"].map(String::from).to_vec(),
            native: vec![],
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.multi_qubit.iter().any(|g| g == gate)
    }

    /// Check if a gate is native (executes without decomposition).
    pub fn is_native(&self, gate: &str) -> bool {
        if self.native.is_empty() {
            self.contains(gate)
        } else {
            self.native.iter().any(|g| g == gate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amplify_ir::QubitId;

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(12);
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 12);
        assert!(caps.gate_set.contains("mcz"));
        assert!(caps.gate_set.is_native("h"));
        assert!(!caps.gate_set.contains("rx"));
    }

    #[test]
    fn test_violations() {
        let caps = Capabilities::simulator(2);
        let mut circuit = Circuit::with_size("wide", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        let reasons = caps.violations(&circuit);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("3 qubits"));

        let mut narrow = GateSet::universal();
        narrow.multi_qubit.clear();
        let caps = Capabilities {
            gate_set: narrow,
            ..Capabilities::simulator(4)
        };
        let mut circuit = Circuit::with_size("mcz", 3, 0);
        circuit.mcz(&[QubitId(0), QubitId(1)], QubitId(2)).unwrap();
        assert_eq!(caps.violations(&circuit), vec!["gate 'mcz' is not supported"]);
    }
}
