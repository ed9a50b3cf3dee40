//! Tabular input and output for batch runs.
//!
//! A batch reads (qubits, threshold) rows from a [`TableSource`] and writes
//! one [`ResultRow`] per input row, in input order, to a [`TableSink`].
//! Rows are not validated here; a bad row fails on its own in the driver.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GroverError, GroverResult};

/// One configuration to run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    /// Number of qubits (n).
    pub qubits: u32,
    /// Success-probability threshold (P) driving the stopping rule.
    #[serde(rename = "probability", alias = "threshold")]
    pub threshold: f64,
}

impl InputRow {
    /// Create an input row.
    pub fn new(qubits: u32, threshold: f64) -> Self {
        Self { qubits, threshold }
    }
}

/// The outcome recorded for one input row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Number of qubits (n).
    pub qubits: u32,
    /// Threshold the row was run with.
    pub threshold: f64,
    /// Measured success frequency; absent when the row was skipped.
    pub probability: Option<f64>,
}

impl ResultRow {
    /// A row that ran to completion.
    pub fn completed(input: InputRow, probability: f64) -> Self {
        Self {
            qubits: input.qubits,
            threshold: input.threshold,
            probability: Some(probability),
        }
    }

    /// A row that failed and was skipped.
    pub fn skipped(input: InputRow) -> Self {
        Self {
            qubits: input.qubits,
            threshold: input.threshold,
            probability: None,
        }
    }
}

/// Something rows can be read from.
pub trait TableSource {
    /// Read every row, in order.
    fn read_rows(&mut self) -> GroverResult<Vec<InputRow>>;
}

/// Something results can be written to.
pub trait TableSink {
    /// Write all results, aligned with the rows that were read.
    fn write_rows(&mut self, rows: &[ResultRow]) -> GroverResult<()>;
}

/// An in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    input: Vec<InputRow>,
    output: Vec<ResultRow>,
}

impl MemoryTable {
    /// Create a table holding `rows` as input.
    pub fn new(rows: Vec<InputRow>) -> Self {
        Self {
            input: rows,
            output: vec![],
        }
    }

    /// Rows written so far.
    pub fn results(&self) -> &[ResultRow] {
        &self.output
    }
}

impl TableSource for MemoryTable {
    fn read_rows(&mut self) -> GroverResult<Vec<InputRow>> {
        Ok(self.input.clone())
    }
}

impl TableSink for MemoryTable {
    fn write_rows(&mut self, rows: &[ResultRow]) -> GroverResult<()> {
        self.output = rows.to_vec();
        Ok(())
    }
}

/// Serialization format of a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// JSON array.
    Json,
    /// YAML sequence.
    Yaml,
}

impl TableFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> GroverResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "json" => Ok(TableFormat::Json),
            "yaml" | "yml" => Ok(TableFormat::Yaml),
            other => Err(GroverError::Table(format!(
                "unsupported table format '{other}' for {} (expected json, yaml or yml)",
                path.display()
            ))),
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(self, source: &str) -> GroverResult<T> {
        match self {
            TableFormat::Json => {
                serde_json::from_str(source).map_err(|e| GroverError::Table(e.to_string()))
            }
            TableFormat::Yaml => {
                serde_yaml_ng::from_str(source).map_err(|e| GroverError::Table(e.to_string()))
            }
        }
    }

    fn render<T: Serialize + ?Sized>(self, value: &T) -> GroverResult<String> {
        match self {
            TableFormat::Json => {
                serde_json::to_string_pretty(value).map_err(|e| GroverError::Table(e.to_string()))
            }
            TableFormat::Yaml => {
                serde_yaml_ng::to_string(value).map_err(|e| GroverError::Table(e.to_string()))
            }
        }
    }
}

/// A table backed by an input file and an output file.
#[derive(Debug, Clone)]
pub struct FileTable {
    input: PathBuf,
    output: PathBuf,
}

impl FileTable {
    /// Read rows from `input` and write results to `output`.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

impl TableSource for FileTable {
    fn read_rows(&mut self) -> GroverResult<Vec<InputRow>> {
        let format = TableFormat::from_path(&self.input)?;
        let source = fs::read_to_string(&self.input).map_err(|e| {
            GroverError::Table(format!("failed to read {}: {e}", self.input.display()))
        })?;
        let rows: Vec<InputRow> = format.parse(&source)?;
        debug!(path = %self.input.display(), rows = rows.len(), "read table");
        Ok(rows)
    }
}

impl TableSink for FileTable {
    fn write_rows(&mut self, rows: &[ResultRow]) -> GroverResult<()> {
        let format = TableFormat::from_path(&self.output)?;
        let rendered = format.render(rows)?;
        fs::write(&self.output, rendered).map_err(|e| {
            GroverError::Table(format!("failed to write {}: {e}", self.output.display()))
        })?;
        debug!(path = %self.output.display(), rows = rows.len(), "wrote table");
        Ok(())
    }
}
