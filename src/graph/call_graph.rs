//! The immutable call graph and its analysis cache.
//!
//! A `CallGraph` is built once, either from a loader or by merging two
//! graphs, and never gains or loses nodes afterwards. Derived results
//! (entry/exit points, execution paths, centralities) are computed on first
//! use and memoized in an `AnalysisCache` owned by the graph.

use super::builder::GraphBuilder;
use super::paths::ExecutionPath;
use crate::call::{Call, CallKey, Granularity};
use crate::loaders::Loader;
use crate::utils::error::{GraphError, LoadError, ParseError};
use log::{debug, info};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Node selection kept both in discovery order and as a hash set
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeSet {
    order: Vec<NodeIndex>,
    members: HashSet<NodeIndex>,
}

impl NodeSet {
    fn new(order: Vec<NodeIndex>) -> Self {
        let members = order.iter().copied().collect();
        Self { order, members }
    }

    pub(crate) fn as_slice(&self) -> &[NodeIndex] {
        &self.order
    }

    pub(crate) fn contains(&self, idx: NodeIndex) -> bool {
        self.members.contains(&idx)
    }
}

/// Lazily populated derived results.
///
/// `OnceLock` keeps the graph `Sync`: concurrent readers either see a
/// finished value or wait for the single initialiser.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnalysisCache {
    pub(crate) entry_points: OnceLock<NodeSet>,
    pub(crate) exit_points: OnceLock<NodeSet>,
    pub(crate) execution_paths: OnceLock<Vec<ExecutionPath>>,
    pub(crate) closeness: OnceLock<Vec<f64>>,
    pub(crate) betweenness: OnceLock<Vec<f64>>,
}

/// Call graph of a software system
///
/// **Public** - main analysis entry point
#[derive(Debug, Clone)]
pub struct CallGraph {
    source: String,
    graph: DiGraph<Call, ()>,
    index: HashMap<CallKey, NodeIndex>,
    load_errors: Vec<ParseError>,
    pub(crate) cache: AnalysisCache,
}

impl CallGraph {
    /// Wrap a finished builder
    pub fn new(source: impl Into<String>, builder: GraphBuilder) -> Self {
        let (graph, index) = builder.into_parts();
        Self {
            source: source.into(),
            graph,
            index,
            load_errors: Vec::new(),
            cache: AnalysisCache::default(),
        }
    }

    /// Run a loader and build the graph at the given granularity.
    ///
    /// Parse errors do not fail the load; they are kept in `load_errors()`.
    ///
    /// # Errors
    /// * `LoadError::SourceNotFound` - trace file or source directory is missing
    /// * `LoadError::SubprocessFailure` - the call graph generator failed
    /// * `LoadError::Io` - the trace could not be read
    pub fn from_loader<L: Loader + ?Sized>(
        loader: &L,
        granularity: Granularity,
    ) -> Result<Self, LoadError> {
        let source = loader.source();
        info!("Loading call graph from {}", source);

        let output = loader.load()?;
        let builder = output.graph.at_granularity(granularity);

        info!(
            "Loaded {} nodes and {} edges ({} parse errors)",
            builder.node_count(),
            builder.edge_count(),
            output.errors.len()
        );

        let mut call_graph = Self::new(source, builder);
        call_graph.load_errors = output.errors;
        Ok(call_graph)
    }

    /// Union of two graphs by call identity.
    ///
    /// Nodes of `a` keep their order; nodes only in `b` follow in `b`'s order.
    pub fn from_merge(a: &CallGraph, b: &CallGraph) -> Self {
        let mut builder = a.to_builder();
        builder.merge(b.to_builder());

        let source = if a.source == b.source {
            a.source.clone()
        } else {
            format!("{}, {}", a.source, b.source)
        };

        debug!(
            "Merged graph has {} nodes and {} edges",
            builder.node_count(),
            builder.edge_count()
        );

        let mut merged = Self::new(source, builder);
        merged.load_errors = a
            .load_errors
            .iter()
            .chain(b.load_errors.iter())
            .cloned()
            .collect();
        merged
    }

    pub(crate) fn to_builder(&self) -> GraphBuilder {
        let mut builder = GraphBuilder::new();
        for idx in self.graph.node_indices() {
            builder.add_call(self.graph[idx].clone());
        }
        for edge in self.graph.edge_references() {
            builder.add_edge(
                self.graph[edge.source()].clone(),
                self.graph[edge.target()].clone(),
            );
        }
        builder
    }

    /// Where the graph came from (trace path or generator description)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Recoverable errors reported while parsing the trace(s)
    pub fn load_errors(&self) -> &[ParseError] {
        &self.load_errors
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All calls, in node order
    pub fn nodes(&self) -> Vec<&Call> {
        self.graph.node_weights().collect()
    }

    /// All edges as (caller, callee) pairs
    pub fn edges(&self) -> Vec<(&Call, &Call)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()]))
            .collect()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.index.contains_key(&call.identity())
    }

    pub fn contains_edge(&self, caller: &Call, callee: &Call) -> bool {
        match (self.index.get(&caller.identity()), self.index.get(&callee.identity())) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Direct callees of `call`
    pub fn successors(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let idx = self.resolve(call)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| &self.graph[n])
            .collect())
    }

    /// Direct callers of `call`
    pub fn predecessors(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let idx = self.resolve(call)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| &self.graph[n])
            .collect())
    }

    /// Look up the node index of a call by identity
    pub(crate) fn resolve(&self, call: &Call) -> Result<NodeIndex, GraphError> {
        self.resolve_key(&call.identity())
    }

    pub(crate) fn resolve_key(&self, key: &CallKey) -> Result<NodeIndex, GraphError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(key.to_string()))
    }

    pub(crate) fn call_at(&self, idx: NodeIndex) -> &Call {
        &self.graph[idx]
    }

    pub(crate) fn graph(&self) -> &DiGraph<Call, ()> {
        &self.graph
    }

    fn select_nodes(&self, predicate: impl Fn(&Call) -> bool) -> NodeSet {
        NodeSet::new(
            self.graph
                .node_indices()
                .filter(|&n| {
                    self.graph
                        .neighbors_directed(n, Direction::Outgoing)
                        .any(|s| predicate(&self.graph[s]))
                })
                .collect(),
        )
    }

    pub(crate) fn entry_set(&self) -> &NodeSet {
        self.cache
            .entry_points
            .get_or_init(|| self.select_nodes(Call::is_input_function))
    }

    pub(crate) fn exit_set(&self) -> &NodeSet {
        self.cache
            .exit_points
            .get_or_init(|| self.select_nodes(Call::is_output_function))
    }

    pub(crate) fn entry_ids(&self) -> &[NodeIndex] {
        self.entry_set().as_slice()
    }

    pub(crate) fn exit_ids(&self) -> &[NodeIndex] {
        self.exit_set().as_slice()
    }

    /// Calls with at least one direct callee that is an input function
    pub fn entry_points(&self) -> Vec<&Call> {
        self.entry_ids().iter().map(|&n| &self.graph[n]).collect()
    }

    /// Calls with at least one direct callee that is an output function
    pub fn exit_points(&self) -> Vec<&Call> {
        self.exit_ids().iter().map(|&n| &self.graph[n]).collect()
    }

    pub fn is_entry_point(&self, call: &Call) -> bool {
        self.index
            .get(&call.identity())
            .is_some_and(|&idx| self.entry_set().contains(idx))
    }

    pub fn is_exit_point(&self, call: &Call) -> bool {
        self.index
            .get(&call.identity())
            .is_some_and(|&idx| self.exit_set().contains(idx))
    }

    /// Tag every node whose function name is in `names` as dangerous.
    ///
    /// Returns the number of nodes tagged. Topology is untouched, so cached
    /// analysis results remain valid.
    pub fn mark_dangerous<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut marked = 0;
        for call in self.graph.node_weights_mut() {
            if names.iter().any(|n| n.as_ref() == call.function_name()) {
                call.set_dangerous(true);
                marked += 1;
            }
        }
        debug!("Marked {} dangerous calls", marked);
        marked
    }

    /// Calls tagged as dangerous
    pub fn dangerous_calls(&self) -> Vec<&Call> {
        self.graph
            .node_weights()
            .filter(|c| c.is_dangerous() == Some(true))
            .collect()
    }
}
