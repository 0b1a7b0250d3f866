//! Loaders for the textual call graph formats of external tools.
//!
//! This module handles:
//! - GNU cflow indentation traces (forward and reverse)
//! - GNU gprof call graph profiles, one file or a directory of them
//! - java-callgraph output, optionally scoped to application packages
//!
//! Every loader turns text into a `GraphBuilder` plus the list of lines it
//! could not parse. Only unrecoverable problems (missing source, failed
//! generator) are returned as `LoadError`.

pub mod cflow;
pub mod gprof;
pub mod javacg;
pub mod multigprof;
pub mod source;
pub mod stack;

use crate::graph::GraphBuilder;
use crate::utils::error::{LoadError, ParseError};

// Re-export main types
pub use cflow::CflowLoader;
pub use gprof::GprofLoader;
pub use javacg::JavaCgLoader;
pub use multigprof::MultiGprofLoader;
pub use stack::IndentationStack;

/// Graph and recoverable errors produced by one load
#[derive(Debug, Clone, Default)]
pub struct LoadOutput {
    pub graph: GraphBuilder,
    pub errors: Vec<ParseError>,
}

impl LoadOutput {
    /// Fold another partial result into this one
    pub fn merge(&mut self, other: LoadOutput) {
        self.graph.merge(other.graph);
        self.errors.extend(other.errors);
    }
}

/// Common contract of all trace loaders
pub trait Loader {
    /// Description of where the trace comes from, used in reports
    fn source(&self) -> String;

    /// Read the trace and build its graph
    fn load(&self) -> Result<LoadOutput, LoadError>;
}
