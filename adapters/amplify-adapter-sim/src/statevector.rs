//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use amplify_ir::{Circuit, Instruction, InstructionKind, StandardGate};

/// A statevector representing a quantum state.
///
/// Amplitude index `i` is the basis state whose bit `k` is the value of
/// qubit `k`.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Run every gate of `circuit` starting from |0...0⟩.
    ///
    /// Measurements are skipped; they are treated as terminal and handled
    /// by sampling the returned state.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut sv = Self::new(circuit.num_qubits());
        sv.run(circuit);
        sv
    }

    /// Apply every instruction of `circuit` to this state.
    pub fn run(&mut self, circuit: &Circuit) {
        for inst in circuit.instructions() {
            self.apply(inst);
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Measurement probability of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction) {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.index()).collect();
                self.apply_standard_gate(&gate.kind, &qubits);
            }
            InstructionKind::Measure => {
                // Terminal measurement does not modify the statevector
            }
        }
    }

    /// Apply a standard gate.
    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_phase(qubits[0], PI),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::T => self.apply_phase(qubits[0], PI / 4.0),
            StandardGate::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            StandardGate::CX => self.apply_mcx(&qubits[..1], qubits[1]),
            StandardGate::CZ | StandardGate::MCZ(_) => self.apply_mcz(qubits),
            StandardGate::CCX => self.apply_mcx(&qubits[..2], qubits[2]),
        }
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] *= phase;
            }
        }
    }

    // =========================================================================
    // Controlled gate implementations
    // =========================================================================

    /// X on `target` when every control is set.
    fn apply_mcx(&mut self, controls: &[usize], target: usize) {
        let ctrl_mask = mask_of(controls);
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask == ctrl_mask) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Sign flip on the basis states where every operand is set.
    fn apply_mcz(&mut self, qubits: &[usize]) {
        let mask = mask_of(qubits);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == mask {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    // =========================================================================
    // Sampling
    // =========================================================================

    /// Sample a single measurement outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }

        // Floating-point rounding: return last index.
        self.amplitudes.len() - 1
    }

    /// Sample `shots` outcomes using one cumulative table.
    pub fn sample_many<R: Rng + ?Sized>(&self, shots: u32, rng: &mut R) -> Vec<usize> {
        let mut cdf = Vec::with_capacity(self.amplitudes.len());
        let mut cumulative = 0.0;
        for amp in &self.amplitudes {
            cumulative += amp.norm_sqr();
            cdf.push(cumulative);
        }
        let last = self.amplitudes.len() - 1;

        (0..shots)
            .map(|_| {
                let r: f64 = rng.r#gen::<f64>() * cumulative;
                cdf.partition_point(|&c| c <= r).min(last)
            })
            .collect()
    }

    /// Convert measurement outcome to bitstring (qubit 0 rightmost).
    pub fn outcome_to_bitstring(&self, outcome: usize) -> String {
        format!("{:0width$b}", outcome, width = self.num_qubits)
    }
}

fn mask_of(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |mask, q| mask | (1 << q))
}
