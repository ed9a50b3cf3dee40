//! Inversion about the mean.

use amplify_ir::Circuit;

use crate::bitstring::BitString;
use crate::error::GroverResult;
use crate::oracle::build_oracle;

/// Build the diffusion operator for `n` qubits.
///
/// H on every qubit, a phase flip of |0…0⟩, H on every qubit. Up to a global
/// phase this reflects the state about the uniform superposition.
pub fn build_diffusion(n: u32) -> GroverResult<Circuit> {
    let zero = BitString::zeros(n)?;
    let oracle = build_oracle(n, &[zero])?;

    let mut circuit = Circuit::with_size("diffusion", n, 0);
    circuit.h_all()?.append(&oracle)?.h_all()?;
    Ok(circuit)
}
