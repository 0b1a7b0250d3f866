//! Report JSON schema definitions.
//!
//! This module defines the structure of the report files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::call::Call;
use serde::{Deserialize, Serialize};

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Where the call graph was loaded from
    pub source: String,

    /// Headline attack surface numbers
    pub summary: Summary,

    /// Per-node metrics and full call lists (verbose reports only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,

    /// Trace lines the loaders could not read
    #[serde(default)]
    pub parse_errors: Vec<ReportedError>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// Attack surface summary of one call graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub nodes_count: usize,
    pub edges_count: usize,
    pub entry_points_count: usize,
    pub exit_points_count: usize,
    pub dangerous_functions_count: usize,
    pub execution_paths_count: usize,

    /// Mean execution path length in nodes, absent without paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_execution_path_length: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_execution_path_length: Option<f64>,

    /// Mean shortest distance from any node to a reachable dangerous call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_dangerous: Option<f64>,
}

/// Everything a verbose report adds on top of the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub nodes: Vec<NodeMetrics>,
    pub edges: Vec<EdgeRecord>,
    pub entry_points: Vec<CallRecord>,
    pub exit_points: Vec<CallRecord>,
    pub dangerous_functions: Vec<CallRecord>,

    /// Mean shortest distance from any node to a reachable entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_entry: Option<f64>,

    /// Mean shortest distance from any node to a reachable exit point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_exit: Option<f64>,

    pub entry_points_clustering: f64,
    pub exit_points_clustering: f64,
}

/// A call as it appears in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub function_name: String,
    pub function_signature: String,
}

impl From<&Call> for CallRecord {
    fn from(call: &Call) -> Self {
        Self {
            function_name: call.function_name().to_string(),
            function_signature: call.function_signature().to_string(),
        }
    }
}

/// A caller/callee pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: CallRecord,
    pub to: CallRecord,
}

/// Structural metrics of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    #[serde(flatten)]
    pub call: CallRecord,
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree_centrality: f64,
    pub closeness: f64,
    pub betweenness: f64,
    pub clustering: f64,
    pub is_entry_point: bool,
    pub is_exit_point: bool,
    pub is_dangerous: bool,
}

/// A recorded parse error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub origin: String,
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}
