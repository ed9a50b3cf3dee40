//! Grover iteration with a randomized stopping rule.
//!
//! [`build_grover_circuit`] prepares the uniform superposition and then
//! appends (oracle, diffusion) rounds while a Bernoulli(P) coin keeps coming
//! up heads, for at most ⌊3/P⌋ rounds. The first tails ends the schedule.
//! [`build_grover_with_iterations`] is the deterministic counterpart used
//! when the round count is known in advance.

use std::f64::consts::FRAC_PI_4;

use rand::Rng;
use tracing::debug;

use amplify_ir::Circuit;

use crate::diffusion::build_diffusion;
use crate::error::{GroverError, GroverResult};

/// A Grover circuit together with the number of rounds it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct GroverCircuit {
    /// The unmeasured circuit.
    pub circuit: Circuit,
    /// Number of (oracle, diffusion) rounds appended.
    pub iterations: u32,
}

/// Check that `p` lies in (0, 1].
pub fn validate_threshold(p: f64) -> GroverResult<()> {
    if p.is_finite() && p > 0.0 && p <= 1.0 {
        Ok(())
    } else {
        Err(GroverError::InvalidConfiguration(format!(
            "success threshold must be in (0, 1], got {p}"
        )))
    }
}

/// Upper bound on rounds for threshold `p`: ⌊3/p⌋.
///
/// Saturates at `u32::MAX` for vanishingly small `p`.
pub fn max_iterations(p: f64) -> GroverResult<u32> {
    validate_threshold(p)?;
    Ok((3.0 / p).floor().min(f64::from(u32::MAX)) as u32)
}

/// Round count that maximizes success for `m` marked states out of 2^n:
/// ⌊π/4 · √(2^n / m)⌋.
pub fn optimal_iterations(n: u32, m: u64) -> GroverResult<u32> {
    if n == 0 || n > 62 {
        return Err(GroverError::InvalidConfiguration(format!(
            "number of qubits must be in 1..=62, got {n}"
        )));
    }
    let space = 1u64 << n;
    if m == 0 || m > space {
        return Err(GroverError::InvalidConfiguration(format!(
            "marked states must be in 1..={space}, got {m}"
        )));
    }
    Ok((FRAC_PI_4 * (space as f64 / m as f64).sqrt()).floor() as u32)
}

fn check_oracle(n: u32, oracle: &Circuit) -> GroverResult<()> {
    if n == 0 {
        return Err(GroverError::InvalidConfiguration(
            "number of qubits must be at least 1".into(),
        ));
    }
    if oracle.num_qubits() != n as usize {
        return Err(GroverError::InvalidConfiguration(format!(
            "oracle acts on {} qubits, expected {n}",
            oracle.num_qubits()
        )));
    }
    Ok(())
}

/// Build a Grover circuit whose round count is drawn from `rng`.
///
/// Each round first draws a coin that succeeds with probability `p`; on
/// success the oracle and diffusion are appended, on failure the schedule
/// stops. Stopping early is not an error.
pub fn build_grover_circuit<R: Rng + ?Sized>(
    n: u32,
    p: f64,
    oracle: &Circuit,
    rng: &mut R,
) -> GroverResult<GroverCircuit> {
    let bound = max_iterations(p)?;
    check_oracle(n, oracle)?;
    let diffusion = build_diffusion(n)?;

    let mut circuit = Circuit::with_size("grover", n, 0);
    circuit.h_all()?;

    let mut iterations = 0;
    while iterations < bound {
        if !rng.gen_bool(p) {
            break;
        }
        circuit.append(oracle)?.append(&diffusion)?;
        iterations += 1;
    }

    debug!(n, p, iterations, bound, "built Grover circuit");
    Ok(GroverCircuit {
        circuit,
        iterations,
    })
}

/// Build a Grover circuit with exactly `iterations` rounds.
pub fn build_grover_with_iterations(
    n: u32,
    iterations: u32,
    oracle: &Circuit,
) -> GroverResult<GroverCircuit> {
    check_oracle(n, oracle)?;
    let diffusion = build_diffusion(n)?;

    let mut circuit = Circuit::with_size("grover", n, 0);
    circuit.h_all()?;
    for _ in 0..iterations {
        circuit.append(oracle)?.append(&diffusion)?;
    }

    debug!(n, iterations, "built fixed Grover circuit");
    Ok(GroverCircuit {
        circuit,
        iterations,
    })
}
