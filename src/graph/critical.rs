//! Critical subgraph: only the calls that lie on some execution path.

use super::builder::GraphBuilder;
use super::call_graph::CallGraph;
use log::debug;
use petgraph::visit::EdgeRef;
use std::collections::HashSet;

impl CallGraph {
    /// Subgraph induced by the nodes of all execution paths.
    ///
    /// Every edge of the full graph between two retained nodes is kept, not
    /// only the edges the paths walk along.
    pub fn get_critical_graph(&self) -> CallGraph {
        let critical: HashSet<_> = self
            .execution_paths()
            .iter()
            .flat_map(|p| p.calls().iter().filter_map(move |key| self.resolve_key(key).ok()))
            .collect();

        let graph = self.graph();
        let mut builder = GraphBuilder::new();
        for idx in graph.node_indices().filter(|n| critical.contains(n)) {
            builder.add_call(graph[idx].clone());
        }
        for edge in graph.edge_references() {
            if critical.contains(&edge.source()) && critical.contains(&edge.target()) {
                builder.add_edge(graph[edge.source()].clone(), graph[edge.target()].clone());
            }
        }

        debug!(
            "Critical graph keeps {} of {} nodes",
            builder.node_count(),
            graph.node_count()
        );
        CallGraph::new(self.source(), builder)
    }
}
