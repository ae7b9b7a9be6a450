//! Error types for instance loading and solver configuration.

use thiserror::Error;

/// Errors raised while building an instance or configuring a run.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("city set is empty")]
    EmptyCitySet,

    #[error("start city '{0}' is not part of the city set")]
    UnknownStartCity(String),

    #[error("city '{0}' is defined more than once")]
    DuplicateCity(String),

    #[error("city '{label}' has a non-finite coordinate ({x}, {y})")]
    InvalidCoordinate { label: String, x: f64, y: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no .tsp or .csv instances found in {0:?}")]
    NoInstances(std::path::PathBuf),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
