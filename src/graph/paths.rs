//! Execution paths and the distance queries built on them.
//!
//! An execution path is the shortest route (by edge count) from one entry
//! point to one exit point. Only one representative path is kept per
//! reachable (entry, exit) pair, which keeps the set polynomial in size.

use super::call_graph::CallGraph;
use crate::call::{Call, CallKey};
use crate::utils::error::GraphError;
use log::debug;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::VecDeque;

/// Ordered call sequence from an entry point to an exit point.
///
/// Calls are held by identity, so a path built on one graph can be queried
/// against any other graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionPath {
    calls: Vec<CallKey>,
}

impl ExecutionPath {
    /// Number of calls on the path, endpoints included
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Identities of the calls along the path
    pub fn calls(&self) -> &[CallKey] {
        &self.calls
    }

    /// Index of `key` on the path
    pub fn position(&self, key: &CallKey) -> Option<usize> {
        self.calls.iter().position(|k| k == key)
    }
}

/// Distance of a call to one end of a path.
///
/// `distance` is `None` when the call does not lie on `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDistance<'a> {
    pub path: &'a ExecutionPath,
    pub distance: Option<usize>,
}

/// Breadth-first predecessor tree rooted at `start`.
///
/// Neighbours are visited in edge insertion order, so ties between equally
/// short paths resolve the same way on every run.
pub(crate) fn bfs_tree(
    call_graph: &CallGraph,
    start: NodeIndex,
    direction: Direction,
) -> (Vec<Option<usize>>, Vec<Option<NodeIndex>>) {
    let graph = call_graph.graph();
    let mut dist = vec![None; graph.node_count()];
    let mut pred = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();

    dist[start.index()] = Some(0);
    queue.push_back(start);

    while let Some(v) = queue.pop_front() {
        let dv = dist[v.index()].unwrap_or(0);
        let mut neighbors: Vec<NodeIndex> = graph.neighbors_directed(v, direction).collect();
        // petgraph yields the most recent edge first
        neighbors.reverse();
        for w in neighbors {
            if dist[w.index()].is_none() {
                dist[w.index()] = Some(dv + 1);
                pred[w.index()] = Some(v);
                queue.push_back(w);
            }
        }
    }

    (dist, pred)
}

fn walk_back(pred: &[Option<NodeIndex>], start: NodeIndex, target: NodeIndex) -> Vec<NodeIndex> {
    let mut nodes = vec![target];
    let mut current = target;
    while current != start {
        match pred[current.index()] {
            Some(p) => {
                nodes.push(p);
                current = p;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}

/// Arithmetic mean of path lengths
///
/// # Errors
/// * `GraphError::EmptyData` - `lengths` is empty
pub fn mean(lengths: &[usize]) -> Result<f64, GraphError> {
    if lengths.is_empty() {
        return Err(GraphError::EmptyData("mean"));
    }
    Ok(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
}

/// Median of path lengths; the mean of the middle pair for even counts
///
/// # Errors
/// * `GraphError::EmptyData` - `lengths` is empty
pub fn median(lengths: &[usize]) -> Result<f64, GraphError> {
    if lengths.is_empty() {
        return Err(GraphError::EmptyData("median"));
    }
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid] as f64)
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    }
}

impl CallGraph {
    fn compute_execution_paths(&self) -> Vec<ExecutionPath> {
        let exits = self.exit_ids();
        let mut paths = Vec::new();

        for &entry in self.entry_ids() {
            let (dist, pred) = bfs_tree(self, entry, Direction::Outgoing);
            for &exit in exits {
                if dist[exit.index()].is_some() {
                    let calls = walk_back(&pred, entry, exit)
                        .into_iter()
                        .map(|n| self.call_at(n).identity())
                        .collect();
                    paths.push(ExecutionPath { calls });
                }
            }
        }

        debug!(
            "Computed {} execution paths from {} entry and {} exit points",
            paths.len(),
            self.entry_ids().len(),
            exits.len()
        );
        paths
    }

    /// One shortest path per connected (entry point, exit point) pair
    pub fn execution_paths(&self) -> &[ExecutionPath] {
        self.cache
            .execution_paths
            .get_or_init(|| self.compute_execution_paths())
    }

    /// Execution paths that pass through `call`
    pub fn get_execution_paths_for(&self, call: &Call) -> Result<Vec<&ExecutionPath>, GraphError> {
        self.resolve(call)?;
        let key = call.identity();
        Ok(self
            .execution_paths()
            .iter()
            .filter(|p| p.position(&key).is_some())
            .collect())
    }

    /// The calls of this graph along a path.
    ///
    /// # Errors
    /// * `GraphError::NodeNotFound` - the path holds a call this graph lacks
    pub fn path_calls(&self, path: &ExecutionPath) -> Result<Vec<&Call>, GraphError> {
        path.calls
            .iter()
            .map(|key| self.resolve_key(key).map(|n| self.call_at(n)))
            .collect()
    }

    /// Build a path from explicit calls, e.g. to query distances on it
    pub fn path_from_calls(&self, calls: &[Call]) -> Result<ExecutionPath, GraphError> {
        let calls = calls
            .iter()
            .map(|c| self.resolve(c).map(|_| c.identity()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExecutionPath { calls })
    }

    /// Shortest path from `source` to `target`, if one exists
    pub fn shortest_path(&self, source: &Call, target: &Call) -> Result<Option<Vec<&Call>>, GraphError> {
        let from = self.resolve(source)?;
        let to = self.resolve(target)?;
        let (dist, pred) = bfs_tree(self, from, Direction::Outgoing);
        Ok(dist[to.index()].map(|_| {
            walk_back(&pred, from, to)
                .into_iter()
                .map(|n| self.call_at(n))
                .collect()
        }))
    }

    fn path_lengths(&self) -> Vec<usize> {
        self.execution_paths().iter().map(ExecutionPath::len).collect()
    }

    /// Mean number of calls per execution path
    pub fn avg_execution_path_length(&self) -> Result<f64, GraphError> {
        mean(&self.path_lengths())
    }

    /// Median number of calls per execution path
    pub fn median_execution_path_length(&self) -> Result<f64, GraphError> {
        median(&self.path_lengths())
    }

    fn distances<'a>(
        &'a self,
        call: &Call,
        paths: Option<&'a [ExecutionPath]>,
        calculator: impl Fn(&ExecutionPath, usize) -> usize,
    ) -> Result<Vec<PathDistance<'a>>, GraphError> {
        self.resolve(call)?;
        let key = call.identity();
        let search: Vec<&'a ExecutionPath> = match paths {
            Some(paths) if !paths.is_empty() => paths.iter().collect(),
            _ => self.get_execution_paths_for(call)?,
        };

        Ok(search
            .into_iter()
            .map(|path| PathDistance {
                path,
                distance: path.position(&key).map(|i| calculator(path, i)),
            })
            .collect())
    }

    /// Distance of `call` from the entry point of each path.
    ///
    /// Defaults to every execution path containing `call`; an empty `paths`
    /// slice is treated like `None`. Explicit paths may come from another
    /// graph; they are matched by call identity.
    pub fn get_distance_to_entry_point<'a>(
        &'a self,
        call: &Call,
        paths: Option<&'a [ExecutionPath]>,
    ) -> Result<Vec<PathDistance<'a>>, GraphError> {
        self.distances(call, paths, |_, i| i)
    }

    /// Distance of `call` to the exit point of each path
    pub fn get_distance_to_exit_point<'a>(
        &'a self,
        call: &Call,
        paths: Option<&'a [ExecutionPath]>,
    ) -> Result<Vec<PathDistance<'a>>, GraphError> {
        self.distances(call, paths, |path, i| path.len() - i - 1)
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

    fn names<'a>(g: &'a CallGraph, path: &ExecutionPath) -> Vec<&'a str> {
        g.path_calls(path)
            .unwrap()
            .iter()
            .map(|c| c.function_name())
            .collect()
    }

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[2, 4, 6]).unwrap(), 4.0);
        assert_eq!(median(&[6, 2, 4]).unwrap(), 4.0);
        assert_eq!(median(&[1, 2, 3, 4]).unwrap(), 2.5);
        assert_eq!(mean(&[]), Err(GraphError::EmptyData("mean")));
        assert_eq!(median(&[]), Err(GraphError::EmptyData("median")));
    }

    #[test]
    fn test_shortest_path_is_chosen() {
        let g = graph(&[
            ("input", "read"),
            ("input", "a"),
            ("a", "b"),
            ("b", "output"),
            ("input", "output"),
            ("output", "write"),
        ]);

        let paths = g.execution_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&g, &paths[0]), vec!["input", "output"]);
    }

    #[test]
    fn test_unreachable_pairs_are_skipped() {
        let g = graph(&[("reader", "gets"), ("writer", "puts")]);
        assert!(g.execution_paths().is_empty());
        assert!(g.avg_execution_path_length().is_err());
    }

    #[test]
    fn test_entry_that_is_also_exit() {
        let g = graph(&[("echo", "read"), ("echo", "write")]);
        let paths = g.execution_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&g, &paths[0]), vec!["echo"]);
        assert_eq!(g.avg_execution_path_length().unwrap(), 1.0);
    }

    #[test]
    fn test_distances() {
        let g = graph(&[
            ("input", "read"),
            ("input", "mid"),
            ("mid", "output"),
            ("output", "write"),
        ]);

        let to_entry = g.get_distance_to_entry_point(&c("mid"), None).unwrap();
        let to_exit = g.get_distance_to_exit_point(&c("mid"), None).unwrap();
        assert_eq!(to_entry.len(), 1);
        assert_eq!(to_entry[0].distance, Some(1));
        assert_eq!(to_exit[0].distance, Some(1));

        let elsewhere = vec![g.path_from_calls(&[c("input"), c("output")]).unwrap()];
        let missing = g.get_distance_to_entry_point(&c("mid"), Some(elsewhere.as_slice())).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].distance, None);
    }

    #[test]
    fn test_distances_on_critical_graph_paths() {
        let g = graph(&[
            ("main", "input"),
            ("input", "read"),
            ("input", "mid"),
            ("mid", "output"),
            ("output", "write"),
        ]);
        let critical = g.get_critical_graph();
        let paths = vec![critical
            .path_from_calls(&[c("input"), c("mid"), c("output")])
            .unwrap()];

        let main = g.get_distance_to_entry_point(&c("main"), Some(paths.as_slice())).unwrap();
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].distance, None);

        let mid = g.get_distance_to_exit_point(&c("mid"), Some(paths.as_slice())).unwrap();
        assert_eq!(mid[0].distance, Some(1));

        assert_eq!(
            critical.path_calls(&g.execution_paths()[0]).unwrap(),
            vec![&c("input"), &c("mid"), &c("output")]
        );
        let foreign = g.path_from_calls(&[c("main"), c("input")]).unwrap();
        assert_eq!(
            critical.path_calls(&foreign),
            Err(GraphError::NodeNotFound("main".to_string()))
        );
    }

    #[test]
    fn test_shortest_path_query() {
        let g = graph(&[("a", "b"), ("b", "c")]);
        let path = g.shortest_path(&c("a"), &c("c")).unwrap().unwrap();
        assert_eq!(path, vec![&c("a"), &c("b"), &c("c")]);
        assert_eq!(g.shortest_path(&c("c"), &c("a")).unwrap(), None);
    }
}
