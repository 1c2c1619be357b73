//! Error type shared by every stage of the generation pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by externally supplied value generators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DataGenError {
    /// Invalid arguments supplied while configuring fields, writers or a definition.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Error getting next value for field {field}: {source}")]
    FieldGeneration {
        field: String,
        #[source]
        source: BoxError,
    },

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("Error writing to file {}: {source}", path.display())]
    SinkPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl DataGenError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn field(field: &str, source: impl Into<BoxError>) -> Self {
        Self::FieldGeneration {
            field: field.to_string(),
            source: source.into(),
        }
    }

    /// Rebuilds an equivalent error, flattening any source chain into its message.
    pub(crate) fn replicate(&self) -> Self {
        match self {
            Self::Configuration(msg) => Self::Configuration(msg.clone()),
            Self::FieldGeneration { field, source } => Self::FieldGeneration {
                field: field.clone(),
                source: source.to_string().into(),
            },
            Self::Csv(e) => Self::Sink(std::io::Error::other(e.to_string())),
            Self::Sink(e) => Self::Sink(std::io::Error::new(e.kind(), e.to_string())),
            Self::SinkPath { path, source } => Self::SinkPath {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::WorkerPool(msg) => Self::WorkerPool(msg.clone()),
        }
    }

    /// Returns true for errors raised before any generation started.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T, E = DataGenError> = std::result::Result<T, E>;
