//! Phase oracle synthesis.

use rustc_hash::FxHashSet;
use tracing::debug;

use amplify_ir::{Circuit, QubitId};

use crate::bitstring::BitString;
use crate::error::{GroverError, GroverResult};

/// Build a phase oracle that flips the sign of every target basis state.
///
/// For each target the block is: X on every qubit whose bit is 0, a Z
/// controlled on all other qubits (plain Z when `n == 1`), then the same X
/// gates again. Blocks for multiple targets are appended back to back.
///
/// The oracle only changes phases, so measuring it on its own gives the
/// same statistics as not applying it.
pub fn build_oracle(n: u32, targets: &[BitString]) -> GroverResult<Circuit> {
    if n == 0 {
        return Err(GroverError::InvalidConfiguration(
            "oracle needs at least one qubit".into(),
        ));
    }
    if targets.is_empty() {
        return Err(GroverError::InvalidConfiguration(
            "oracle needs at least one target".into(),
        ));
    }

    let mut seen = FxHashSet::default();
    for target in targets {
        if target.width() != n as usize {
            return Err(GroverError::InvalidConfiguration(format!(
                "target '{target}' has {} bits, expected {n}",
                target.width()
            )));
        }
        if !seen.insert(target) {
            return Err(GroverError::InvalidConfiguration(format!(
                "duplicate target '{target}'"
            )));
        }
    }

    let mut circuit = Circuit::with_size("oracle", n, 0);
    let controls: Vec<QubitId> = (0..n - 1).map(QubitId).collect();
    let last = QubitId(n - 1);

    for target in targets {
        let flips: Vec<QubitId> = target.zero_qubits().map(|q| QubitId(q as u32)).collect();

        for &q in &flips {
            circuit.x(q)?;
        }
        if n == 1 {
            circuit.z(last)?;
        } else {
            circuit.mcz(&controls, last)?;
        }
        for &q in &flips {
            circuit.x(q)?;
        }
    }

    debug!(n, targets = targets.len(), ops = circuit.num_ops(), "built oracle");
    Ok(circuit)
}
