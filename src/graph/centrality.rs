//! Degree, closeness, betweenness and clustering metrics.
//!
//! Every metric comes in two flavours: a per-call query that fails with
//! `GraphError::NodeNotFound` for unknown calls, and a `*_map` variant that
//! covers every node of the graph.

use super::call_graph::CallGraph;
use super::paths::bfs_tree;
use crate::call::Call;
use crate::utils::error::GraphError;
use log::debug;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

impl CallGraph {
    fn per_node<T: Copy>(&self, values: impl Fn(NodeIndex) -> T) -> HashMap<&Call, T> {
        self.graph()
            .node_indices()
            .map(|n| (self.call_at(n), values(n)))
            .collect()
    }

    fn in_degree_of(&self, idx: NodeIndex) -> usize {
        self.graph().edges_directed(idx, Direction::Incoming).count()
    }

    fn out_degree_of(&self, idx: NodeIndex) -> usize {
        self.graph().edges_directed(idx, Direction::Outgoing).count()
    }

    /// Normalise a raw count by `n - 1`; every node scores 1.0 in graphs of
    /// at most one node.
    fn normalize_degree(&self, count: usize) -> f64 {
        let n = self.node_count();
        if n <= 1 {
            1.0
        } else {
            count as f64 / (n - 1) as f64
        }
    }

    /// Number of edges touching `call` (a self-loop counts twice)
    pub fn degree(&self, call: &Call) -> Result<usize, GraphError> {
        let idx = self.resolve(call)?;
        Ok(self.in_degree_of(idx) + self.out_degree_of(idx))
    }

    pub fn degree_map(&self) -> HashMap<&Call, usize> {
        self.per_node(|n| self.in_degree_of(n) + self.out_degree_of(n))
    }

    /// Number of callers of `call`
    pub fn in_degree(&self, call: &Call) -> Result<usize, GraphError> {
        Ok(self.in_degree_of(self.resolve(call)?))
    }

    pub fn in_degree_map(&self) -> HashMap<&Call, usize> {
        self.per_node(|n| self.in_degree_of(n))
    }

    /// Number of callees of `call`
    pub fn out_degree(&self, call: &Call) -> Result<usize, GraphError> {
        Ok(self.out_degree_of(self.resolve(call)?))
    }

    pub fn out_degree_map(&self) -> HashMap<&Call, usize> {
        self.per_node(|n| self.out_degree_of(n))
    }

    /// Fraction of the other nodes `call` is connected to
    pub fn degree_centrality(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(self.normalize_degree(self.degree(call)?))
    }

    pub fn degree_centrality_map(&self) -> HashMap<&Call, f64> {
        self.per_node(|n| self.normalize_degree(self.in_degree_of(n) + self.out_degree_of(n)))
    }

    pub fn in_degree_centrality(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(self.normalize_degree(self.in_degree(call)?))
    }

    pub fn in_degree_centrality_map(&self) -> HashMap<&Call, f64> {
        self.per_node(|n| self.normalize_degree(self.in_degree_of(n)))
    }

    pub fn out_degree_centrality(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(self.normalize_degree(self.out_degree(call)?))
    }

    pub fn out_degree_centrality_map(&self) -> HashMap<&Call, f64> {
        self.per_node(|n| self.normalize_degree(self.out_degree_of(n)))
    }

    fn closeness_values(&self) -> &[f64] {
        self.cache.closeness.get_or_init(|| {
            let n = self.node_count();
            self.graph()
                .node_indices()
                .map(|v| {
                    let (dist, _) = bfs_tree(self, v, Direction::Outgoing);
                    let (reachable, total) = dist
                        .iter()
                        .flatten()
                        .fold((0usize, 0usize), |(r, t), d| (r + 1, t + d));
                    if total == 0 || n <= 1 {
                        return 0.0;
                    }
                    let others = (reachable - 1) as f64;
                    (others / total as f64) * (others / (n - 1) as f64)
                })
                .collect()
        })
    }

    /// Closeness of `call` over the nodes it can reach.
    ///
    /// The reciprocal mean distance is scaled by the share of the graph
    /// that is reachable, so calls reaching few nodes are not over-rated.
    pub fn closeness(&self, call: &Call) -> Result<f64, GraphError> {
        let idx = self.resolve(call)?;
        Ok(self.closeness_values()[idx.index()])
    }

    pub fn closeness_map(&self) -> HashMap<&Call, f64> {
        let values = self.closeness_values();
        self.per_node(|n| values[n.index()])
    }

    /// Brandes' algorithm: one BFS per source accumulating shortest path
    /// counts (sigma) and dependencies (delta).
    fn betweenness_values(&self) -> &[f64] {
        self.cache.betweenness.get_or_init(|| {
            let graph = self.graph();
            let n = graph.node_count();
            let mut betweenness = vec![0.0f64; n];

            for s in graph.node_indices() {
                let mut stack = Vec::with_capacity(n);
                let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
                let mut sigma = vec![0.0f64; n];
                let mut dist: Vec<Option<usize>> = vec![None; n];
                let mut queue = VecDeque::new();

                sigma[s.index()] = 1.0;
                dist[s.index()] = Some(0);
                queue.push_back(s);

                while let Some(v) = queue.pop_front() {
                    stack.push(v.index());
                    let dv = dist[v.index()].unwrap_or(0);
                    for w in graph.neighbors_directed(v, Direction::Outgoing) {
                        let wi = w.index();
                        if dist[wi].is_none() {
                            dist[wi] = Some(dv + 1);
                            queue.push_back(w);
                        }
                        if dist[wi] == Some(dv + 1) {
                            sigma[wi] += sigma[v.index()];
                            preds[wi].push(v.index());
                        }
                    }
                }

                let mut delta = vec![0.0f64; n];
                while let Some(w) = stack.pop() {
                    for &v in &preds[w] {
                        delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                    }
                    if w != s.index() {
                        betweenness[w] += delta[w];
                    }
                }
            }

            if n > 2 {
                let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
                for value in &mut betweenness {
                    *value *= scale;
                }
            }

            debug!("Computed betweenness for {} nodes", n);
            betweenness
        })
    }

    /// Fraction of all-pairs shortest paths passing through `call`
    pub fn betweenness(&self, call: &Call) -> Result<f64, GraphError> {
        let idx = self.resolve(call)?;
        Ok(self.betweenness_values()[idx.index()])
    }

    pub fn betweenness_map(&self) -> HashMap<&Call, f64> {
        let values = self.betweenness_values();
        self.per_node(|n| values[n.index()])
    }

    fn undirected_neighbors(&self, idx: NodeIndex) -> HashSet<NodeIndex> {
        self.graph()
            .neighbors_undirected(idx)
            .filter(|&n| n != idx)
            .collect()
    }

    fn clustering_of(&self, idx: NodeIndex) -> f64 {
        let neighbors = self.undirected_neighbors(idx);
        let degree = neighbors.len();
        if degree < 2 {
            return 0.0;
        }
        // Each triangle is seen once from each of its two other corners
        let links: usize = neighbors
            .iter()
            .map(|&w| {
                self.undirected_neighbors(w)
                    .intersection(&neighbors)
                    .count()
            })
            .sum();
        links as f64 / (degree * (degree - 1)) as f64
    }

    /// Local clustering coefficient of `call` in the undirected projection
    pub fn clustering(&self, call: &Call) -> Result<f64, GraphError> {
        Ok(self.clustering_of(self.resolve(call)?))
    }

    /// Mean local clustering coefficient over `calls` (0.0 for no calls)
    pub fn average_clustering(&self, calls: &[&Call]) -> Result<f64, GraphError> {
        let ids = calls
            .iter()
            .map(|c| self.resolve(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.average_clustering_of(&ids))
    }

    fn average_clustering_of(&self, ids: &[NodeIndex]) -> f64 {
        if ids.is_empty() {
            return 0.0;
        }
        ids.iter().map(|&n| self.clustering_of(n)).sum::<f64>() / ids.len() as f64
    }

    pub fn entry_points_clustering(&self) -> f64 {
        self.average_clustering_of(self.entry_ids())
    }

    pub fn exit_points_clustering(&self) -> f64 {
        self.average_clustering_of(self.exit_ids())
    }
}
