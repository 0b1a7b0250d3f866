//! Turns an analysed `CallGraph` into a `Report`.

use super::schema::{CallRecord, Details, EdgeRecord, NodeMetrics, Report, ReportedError, Summary};
use crate::call::Call;
use crate::graph::CallGraph;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::{GraphError, ParseError};
use chrono::Utc;
use log::debug;

impl From<&ParseError> for ReportedError {
    fn from(error: &ParseError) -> Self {
        Self {
            origin: error.origin.clone(),
            line_number: error.line_number,
            line: error.line.clone(),
            reason: error.reason.clone(),
        }
    }
}

/// Mean of every distance produced by `distances` over all nodes,
/// `None` when no node reaches a target
fn mean_distance<'a>(
    call_graph: &'a CallGraph,
    distances: impl Fn(&'a Call) -> Result<Vec<(&'a Call, usize)>, GraphError>,
) -> Result<Option<f64>, GraphError> {
    let mut total = 0usize;
    let mut count = 0usize;
    for call in call_graph.nodes() {
        for (_, d) in distances(call)? {
            total += d;
            count += 1;
        }
    }
    Ok((count > 0).then(|| total as f64 / count as f64))
}

/// Build the report for a call graph
///
/// **Public** - main entry point for report generation
///
/// # Arguments
/// * `call_graph` - Graph to summarise
/// * `verbose` - Include per-node metrics and call lists
///
/// # Errors
/// * `GraphError::NodeNotFound` - never for nodes taken from the graph itself
pub fn build_report(call_graph: &CallGraph, verbose: bool) -> Result<Report, GraphError> {
    let avg = call_graph.avg_execution_path_length().ok();
    let median = call_graph.median_execution_path_length().ok();

    let distance_dangerous = if call_graph.dangerous_calls().is_empty() {
        None
    } else {
        mean_distance(call_graph, |c| call_graph.distance_to_dangerous(c))?
    };

    let summary = Summary {
        nodes_count: call_graph.node_count(),
        edges_count: call_graph.edge_count(),
        entry_points_count: call_graph.entry_points().len(),
        exit_points_count: call_graph.exit_points().len(),
        dangerous_functions_count: call_graph.dangerous_calls().len(),
        execution_paths_count: call_graph.execution_paths().len(),
        avg_execution_path_length: avg,
        median_execution_path_length: median,
        distance_dangerous,
    };

    let details = if verbose {
        Some(build_details(call_graph)?)
    } else {
        None
    };

    debug!(
        "Built report for {} ({} nodes, verbose: {})",
        call_graph.source(),
        summary.nodes_count,
        verbose
    );

    Ok(Report {
        version: SCHEMA_VERSION.to_string(),
        source: call_graph.source().to_string(),
        summary,
        details,
        parse_errors: call_graph.load_errors().iter().map(ReportedError::from).collect(),
        generated_at: Utc::now().to_rfc3339(),
    })
}

/// **Private** - verbose part of the report
fn build_details(call_graph: &CallGraph) -> Result<Details, GraphError> {
    let degree_centrality = call_graph.degree_centrality_map();
    let closeness = call_graph.closeness_map();
    let betweenness = call_graph.betweenness_map();

    let mut nodes = Vec::with_capacity(call_graph.node_count());
    for call in call_graph.nodes() {
        nodes.push(NodeMetrics {
            call: CallRecord::from(call),
            degree: call_graph.degree(call)?,
            in_degree: call_graph.in_degree(call)?,
            out_degree: call_graph.out_degree(call)?,
            degree_centrality: degree_centrality.get(call).copied().unwrap_or(0.0),
            closeness: closeness.get(call).copied().unwrap_or(0.0),
            betweenness: betweenness.get(call).copied().unwrap_or(0.0),
            clustering: call_graph.clustering(call)?,
            is_entry_point: call_graph.is_entry_point(call),
            is_exit_point: call_graph.is_exit_point(call),
            is_dangerous: call.is_dangerous() == Some(true),
        });
    }

    let records = |calls: Vec<&Call>| calls.into_iter().map(CallRecord::from).collect::<Vec<_>>();

    Ok(Details {
        nodes,
        edges: call_graph
            .edges()
            .into_iter()
            .map(|(from, to)| EdgeRecord {
                from: from.into(),
                to: to.into(),
            })
            .collect(),
        entry_points: records(call_graph.entry_points()),
        exit_points: records(call_graph.exit_points()),
        dangerous_functions: records(call_graph.dangerous_calls()),
        distance_entry: mean_distance(call_graph, |c| call_graph.distance_to_entry_points(c))?,
        distance_exit: mean_distance(call_graph, |c| call_graph.distance_to_exit_points(c))?,
        entry_points_clustering: call_graph.entry_points_clustering(),
        exit_points_clustering: call_graph.exit_points_clustering(),
    })
}
