//! Configuration types for test data generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataGenError, Result};
use crate::writer::Writer;

/// Rows generated when no row count is configured.
pub const DEFAULT_ROW_COUNT: u64 = 1;

/// Run settings that can be loaded from JSON and applied to a definition builder.
///
/// ```json
/// {
///   "row_count": 1000,
///   "parallel": true,
///   "seed": 42,
///   "writer": { "format": "flat", "delimiter": "|", "include_header": false }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of records to generate.
    pub row_count: u64,

    /// Whether rows are generated on a worker pool.
    pub parallel: bool,

    /// Worker pool size when parallel. `None` uses one worker per core.
    pub worker_threads: Option<usize>,

    /// Seed for the per-row random number generators.
    pub seed: Option<u64>,

    /// Output encoding.
    pub writer: Writer,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            parallel: false,
            worker_threads: None,
            seed: None,
            writer: Writer::csv(),
        }
    }
}

impl GenerationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DataGenError::config(format!("invalid generation config: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DataGenError::config(format!("could not read config {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }
}
