//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a single load attempt
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Call graph generator failed: {0}")]
    SubprocessFailure(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A malformed trace line.
///
/// Parse errors are recoverable: the loader records them and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{origin}:{line_number}: {reason}: {line:?}")]
pub struct ParseError {
    /// Trace the line came from (file path or generator description)
    pub origin: String,

    /// One-based line number within the trace
    pub line_number: usize,

    /// The offending line, without its trailing newline
    pub line: String,

    /// What was wrong with it
    pub reason: String,
}

/// Errors raised by queries against a built call graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Call not found in graph: {0}")]
    NodeNotFound(String),

    #[error("Cannot compute {0} over an empty set")]
    EmptyData(&'static str),
}

/// Errors that can occur during report output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Incompatible report schema: found v{found}, expected v{expected}")]
    IncompatibleVersion { found: String, expected: String },
}
