//! Call graph construction and analysis.
//!
//! This module transforms loader output into an immutable `CallGraph` and
//! provides the analytic queries over it:
//! - Entry/exit point classification
//! - Execution paths and distances
//! - Degree, closeness, betweenness and clustering
//! - Ancestor/descendant set algebra
//! - Critical subgraph extraction

pub mod builder;
pub mod call_graph;
pub mod centrality;
pub mod critical;
pub mod paths;
pub mod reachability;

// Re-export main types
pub use builder::GraphBuilder;
pub use call_graph::CallGraph;
pub use paths::{mean, median, ExecutionPath, PathDistance};
