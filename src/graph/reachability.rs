//! Ancestor/descendant sets and their overlap with entry and exit points.

use super::call_graph::{CallGraph, NodeSet};
use super::paths::bfs_tree;
use crate::call::Call;
use crate::utils::error::GraphError;
use petgraph::graph::NodeIndex;
use petgraph::Direction;

/// `|contained ∩ container| / |contained|`, 0.0 for an empty `contained`
fn ratio_of_containment(contained: &[NodeIndex], container: &NodeSet) -> f64 {
    if contained.is_empty() {
        return 0.0;
    }
    contained_in(contained, container).len() as f64 / contained.len() as f64
}

fn contained_in(contained: &[NodeIndex], container: &NodeSet) -> Vec<NodeIndex> {
    contained
        .iter()
        .copied()
        .filter(|&n| container.contains(n))
        .collect()
}

impl CallGraph {
    /// Every node reachable from `idx` in `direction`, excluding `idx` itself
    fn reachable_from(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let (dist, _) = bfs_tree(self, idx, direction);
        dist.iter()
            .enumerate()
            .filter(|&(i, d)| d.is_some() && i != idx.index())
            .map(|(i, _)| NodeIndex::new(i))
            .collect()
    }

    fn descendant_ids(&self, call: &Call) -> Result<Vec<NodeIndex>, GraphError> {
        Ok(self.reachable_from(self.resolve(call)?, Direction::Outgoing))
    }

    fn ancestor_ids(&self, call: &Call) -> Result<Vec<NodeIndex>, GraphError> {
        Ok(self.reachable_from(self.resolve(call)?, Direction::Incoming))
    }

    fn to_calls(&self, ids: Vec<NodeIndex>) -> Vec<&Call> {
        ids.into_iter().map(|n| self.call_at(n)).collect()
    }

    /// All calls reachable from `call`
    pub fn get_descendants(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        Ok(self.to_calls(self.descendant_ids(call)?))
    }

    /// All calls that can reach `call`
    pub fn get_ancestors(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        Ok(self.to_calls(self.ancestor_ids(call)?))
    }

    pub fn get_descendant_entry_points(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let ids = contained_in(&self.descendant_ids(call)?, self.entry_set());
        Ok(self.to_calls(ids))
    }

    pub fn get_descendant_exit_points(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let ids = contained_in(&self.descendant_ids(call)?, self.exit_set());
        Ok(self.to_calls(ids))
    }

    pub fn get_ancestor_entry_points(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let ids = contained_in(&self.ancestor_ids(call)?, self.entry_set());
        Ok(self.to_calls(ids))
    }

    pub fn get_ancestor_exit_points(&self, call: &Call) -> Result<Vec<&Call>, GraphError> {
        let ids = contained_in(&self.ancestor_ids(call)?, self.exit_set());
        Ok(self.to_calls(ids))
    }

    /// Share of `call`'s descendants that are entry points
    pub fn get_descendants_entry_point_ratio(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(ratio_of_containment(&self.descendant_ids(call)?, self.entry_set()))
    }

    /// Share of `call`'s descendants that are exit points
    pub fn get_descendants_exit_point_ratio(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(ratio_of_containment(&self.descendant_ids(call)?, self.exit_set()))
    }

    /// Share of `call`'s ancestors that are entry points
    pub fn get_ancestors_entry_point_ratio(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(ratio_of_containment(&self.ancestor_ids(call)?, self.entry_set()))
    }

    /// Share of `call`'s ancestors that are exit points
    pub fn get_ancestors_exit_point_ratio(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(ratio_of_containment(&self.ancestor_ids(call)?, self.exit_set()))
    }

    /// Shortest distance from `call` to each reachable node accepted by `keep`
    fn distances_where(
        &self,
        call: &Call,
        keep: impl Fn(NodeIndex) -> bool,
    ) -> Result<Vec<(&Call, usize)>, GraphError> {
        let (dist, _) = bfs_tree(self, self.resolve(call)?, Direction::Outgoing);
        Ok(dist
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                let idx = NodeIndex::new(i);
                d.filter(|_| keep(idx)).map(|d| (self.call_at(idx), d))
            })
            .collect())
    }

    /// Shortest distance from `call` to every dangerous call it can reach.
    ///
    /// A dangerous `call` is reported at distance 0.
    pub fn distance_to_dangerous(&self, call: &Call) -> Result<Vec<(&Call, usize)>, GraphError> {
        self.distances_where(call, |idx| self.call_at(idx).is_dangerous() == Some(true))
    }

    /// Shortest distance from `call` to every entry point it can reach
    pub fn distance_to_entry_points(&self, call: &Call) -> Result<Vec<(&Call, usize)>, GraphError> {
        let entries = self.entry_set();
        self.distances_where(call, |idx| entries.contains(idx))
    }

    /// Shortest distance from `call` to every exit point it can reach
    pub fn distance_to_exit_points(&self, call: &Call) -> Result<Vec<(&Call, usize)>, GraphError> {
        let exits = self.exit_set();
        self.distances_where(call, |idx| exits.contains(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn c(name: &str) -> Call {
        Call::new(name, "")
    }

    fn graph(edges: &[(&str, &str)]) -> CallGraph {
        let mut builder = GraphBuilder::new();
        for (from, to) in edges {
            builder.add_edge(c(from), c(to));
        }
        CallGraph::new("test", builder)
    }

    fn sorted_names(calls: Vec<&Call>) -> Vec<String> {
        let mut names: Vec<String> = calls.iter().map(|c| c.function_name().to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let g = graph(&[("main", "a"), ("a", "b"), ("b", "a"), ("main", "c")]);
        assert_eq!(sorted_names(g.get_descendants(&c("main")).unwrap()), ["a", "b", "c"]);
        assert_eq!(sorted_names(g.get_descendants(&c("a")).unwrap()), ["b"]);
        assert_eq!(sorted_names(g.get_ancestors(&c("a")).unwrap()), ["b", "main"]);
        assert!(g.get_ancestors(&c("main")).unwrap().is_empty());
    }

    #[test]
    fn test_containment_ratios() {
        let g = graph(&[
            ("main", "reader"),
            ("main", "helper"),
            ("reader", "fgets"),
            ("reader", "writer"),
            ("writer", "fputs"),
        ]);

        // main -> {reader, helper, fgets, writer, fputs}
        assert!((g.get_descendants_entry_point_ratio(&c("main")).unwrap() - 0.2).abs() < 1e-9);
        assert!((g.get_descendants_exit_point_ratio(&c("main")).unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(g.get_ancestors_entry_point_ratio(&c("writer")).unwrap(), 0.5);
        assert_eq!(g.get_descendant_exit_points(&c("reader")).unwrap(), vec![&c("writer")]);
        assert_eq!(g.get_ancestor_entry_points(&c("fputs")).unwrap(), vec![&c("reader")]);
    }

    #[test]
    fn test_empty_sets_give_zero_ratio() {
        let g = graph(&[("main", "gets")]);
        assert_eq!(g.get_ancestors_entry_point_ratio(&c("main")).unwrap(), 0.0);
        assert_eq!(g.get_ancestors_exit_point_ratio(&c("main")).unwrap(), 0.0);
        assert_eq!(g.get_descendants_entry_point_ratio(&c("gets")).unwrap(), 0.0);
        assert_eq!(g.get_descendants_exit_point_ratio(&c("gets")).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_to_dangerous() {
        let mut g = graph(&[("main", "copy"), ("copy", "strcpy"), ("main", "gets")]);
        g.mark_dangerous(&["strcpy", "gets"]);

        let mut found: Vec<(String, usize)> = g
            .distance_to_dangerous(&c("main"))
            .unwrap()
            .into_iter()
            .map(|(call, d)| (call.function_name().to_string(), d))
            .collect();
        found.sort();
        assert_eq!(found, vec![("gets".to_string(), 1), ("strcpy".to_string(), 2)]);
    }

    #[test]
    fn test_many_entry_points_on_a_chain() {
        let names: Vec<String> = (0..400).map(|i| format!("f{}", i)).collect();
        let mut builder = GraphBuilder::new();
        for pair in names.windows(2) {
            builder.add_edge(c(&pair[0]), c(&pair[1]));
        }
        for name in names.iter().step_by(4) {
            builder.add_edge(c(name), c("read"));
        }
        let g = CallGraph::new("chain", builder);

        assert_eq!(g.entry_points().len(), 100);
        assert_eq!(g.distance_to_entry_points(&c("f0")).unwrap().len(), 100);
        assert_eq!(g.distance_to_entry_points(&c("f397")).unwrap().len(), 0);
        assert_eq!(g.get_descendant_entry_points(&c("f1")).unwrap().len(), 99);
        let ratio = g.get_ancestors_entry_point_ratio(&c("f399")).unwrap();
        assert!((ratio - 100.0 / 399.0).abs() < 1e-9);
        assert!(g.is_entry_point(&c("f396")));
        assert!(!g.is_entry_point(&c("f397")));
    }

    #[test]
    fn test_distance_to_entry_and_exit_points() {
        let g = graph(&[("main", "reader"), ("reader", "read"), ("main", "log"), ("log", "write")]);

        let entries = g.distance_to_entry_points(&c("main")).unwrap();
        assert_eq!(entries, vec![(&c("reader"), 1)]);

        let exits = g.distance_to_exit_points(&c("log")).unwrap();
        assert_eq!(exits, vec![(&c("log"), 0)]);
    }
}
