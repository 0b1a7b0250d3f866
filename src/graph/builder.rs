//! Interned node table that loaders write into.
//!
//! Every distinct `(function_name, function_signature)` is assigned one
//! `NodeIndex` in a petgraph arena. Edges are deduplicated, so a call site
//! observed many times still yields a single caller -> callee edge.

use crate::call::{Call, CallKey, Granularity};
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Mutable graph under construction
///
/// **Public** - produced by loaders, consumed by `CallGraph`
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    graph: DiGraph<Call, ()>,
    index: HashMap<CallKey, NodeIndex>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a call, returning its node index.
    ///
    /// A danger tag on the incoming call is kept if the stored node has none.
    pub fn add_call(&mut self, call: Call) -> NodeIndex {
        if let Some(&idx) = self.index.get(&call.identity()) {
            if let Some(dangerous) = call.is_dangerous() {
                let node = &mut self.graph[idx];
                if dangerous || node.is_dangerous().is_none() {
                    node.set_dangerous(dangerous);
                }
            }
            return idx;
        }

        let key = call.identity();
        let idx = self.graph.add_node(call);
        self.index.insert(key, idx);
        idx
    }

    /// Add a caller -> callee edge, interning both ends
    pub fn add_edge(&mut self, caller: Call, callee: Call) {
        let from = self.add_call(caller);
        let to = self.add_call(callee);
        self.graph.update_edge(from, to, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
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

    /// Calls in insertion order
    pub fn calls(&self) -> impl Iterator<Item = &Call> + '_ {
        self.graph.node_weights()
    }

    /// Edges as (caller, callee) pairs in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&Call, &Call)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()]))
    }

    /// Union another graph into this one by identity.
    ///
    /// Nodes already present keep their index; new nodes are appended in the
    /// other graph's order, so merging in a fixed order is deterministic.
    pub fn merge(&mut self, other: GraphBuilder) {
        debug!(
            "Merging graph ({} nodes, {} edges) into ({} nodes, {} edges)",
            other.node_count(),
            other.edge_count(),
            self.node_count(),
            self.edge_count()
        );

        let GraphBuilder { graph, .. } = other;
        let mut remap = Vec::with_capacity(graph.node_count());
        for idx in graph.node_indices() {
            remap.push(self.add_call(graph[idx].clone()));
        }
        for edge in graph.edge_references() {
            let from = remap[edge.source().index()];
            let to = remap[edge.target().index()];
            self.graph.update_edge(from, to, ());
        }
    }

    /// Rebuild this graph at the requested granularity.
    ///
    /// Collapsing to files turns intra-file calls into self-edges; those are dropped.
    pub fn at_granularity(self, granularity: Granularity) -> GraphBuilder {
        if granularity == Granularity::Function {
            return self;
        }

        let mut collapsed = GraphBuilder::new();
        let mut remap = Vec::with_capacity(self.graph.node_count());
        for idx in self.graph.node_indices() {
            remap.push(collapsed.add_call(self.graph[idx].at_granularity(granularity)));
        }
        for edge in self.graph.edge_references() {
            let from = remap[edge.source().index()];
            let to = remap[edge.target().index()];
            if from != to {
                collapsed.graph.update_edge(from, to, ());
            }
        }

        debug!(
            "Collapsed {} function nodes into {} file nodes",
            self.graph.node_count(),
            collapsed.node_count()
        );
        collapsed
    }

    pub(crate) fn into_parts(self) -> (DiGraph<Call, ()>, HashMap<CallKey, NodeIndex>) {
        (self.graph, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str) -> Call {
        Call::new(name, "")
    }

    #[test]
    fn test_repeated_calls_collapse() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(call("main"), call("printf"));
        builder.add_edge(call("main"), call("printf"));
        builder.add_edge(call("helper"), call("printf"));

        assert_eq!(builder.node_count(), 3);
        assert_eq!(builder.edge_count(), 2);
        assert!(builder.contains_edge(&call("main"), &call("printf")));
        assert!(!builder.contains_edge(&call("printf"), &call("main")));
    }

    #[test]
    fn test_merge_unions_by_identity() {
        let mut a = GraphBuilder::new();
        a.add_edge(call("main"), call("parse"));

        let mut b = GraphBuilder::new();
        b.add_edge(call("parse"), call("read"));
        b.add_edge(call("main"), call("parse"));

        a.merge(b);
        assert_eq!(a.node_count(), 3);
        assert_eq!(a.edge_count(), 2);
        assert!(a.contains_edge(&call("parse"), &call("read")));
    }

    #[test]
    fn test_danger_tag_survives_merge() {
        let mut a = GraphBuilder::new();
        a.add_call(call("strcpy"));

        let mut tagged = call("strcpy");
        tagged.set_dangerous(true);
        let mut b = GraphBuilder::new();
        b.add_call(tagged);

        a.merge(b);
        assert_eq!(a.calls().next().and_then(Call::is_dangerous), Some(true));
    }

    #[test]
    fn test_file_granularity_drops_intra_file_edges() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(Call::new("main", "main.c"), Call::new("usage", "main.c"));
        builder.add_edge(Call::new("main", "main.c"), Call::new("parse", "parse.c"));
        builder.add_edge(Call::new("parse", "parse.c"), Call::new("fgets", ""));

        let files = builder.at_granularity(Granularity::File);
        assert_eq!(files.node_count(), 3);
        assert_eq!(files.edge_count(), 2);
        assert!(files.contains_edge(&Call::new("main.c", ""), &Call::new("parse.c", "")));
        assert!(files.contains_edge(&Call::new("parse.c", ""), &Call::new("fgets", "")));
    }
}
