//! Error types for the Grover engine.

use amplify_hal::HalError;
use amplify_ir::IrError;
use thiserror::Error;

/// Errors produced while building, running or recording Grover searches.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GroverError {
    /// Input parameters cannot describe a valid search.
    ///
    /// Raised before any circuit is produced or submitted; never retried.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The execution backend failed, timed out or answered with malformed data.
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// Circuit builder returned an error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] IrError),

    /// Reading or writing a table failed.
    #[error("Table error: {0}")]
    Table(String),

    /// Configuration file could not be loaded or is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

impl GroverError {
    /// Whether running the same row again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GroverError::BackendFailure(_))
    }
}

impl From<HalError> for GroverError {
    fn from(err: HalError) -> Self {
        match err {
            HalError::CircuitTooLarge(_) | HalError::InvalidShots(_) | HalError::InvalidCircuit(_) => {
                GroverError::InvalidConfiguration(err.to_string())
            }
            other => GroverError::BackendFailure(other.to_string()),
        }
    }
}

/// Result type for Grover engine operations.
pub type GroverResult<T> = Result<T, GroverError>;
