//! Community detection over a [`NetworkGraph`].
//!
//! Detection strategies implement [`CommunityDetection`] and return a
//! [`Partition`]: communities ordered by size, largest first. [`annotate`]
//! writes each node's position in that order back onto the graph.
//!
//! # Greedy modularity
//!
//! [`GreedyModularity`] is the Clauset–Newman–Moore agglomeration:
//!
//! 1. Every node starts in its own community.
//! 2. The connected pair of communities with the largest modularity gain
//!    `ΔQ` is merged, and the gains of their neighbours are updated.
//! 3. Merging stops once the best gain is negative.
//!
//! Ties on `ΔQ` go to the smallest `(u, v)` pair of community indices, which
//! follow node insertion order, so results are reproducible for a given
//! input file.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::graph::NetworkGraph;
use crate::{Error, Result};

/// Node attribute that receives the community id.
pub const COMMUNITY_KEY: &str = "community";

/// A community detection strategy.
pub trait CommunityDetection {
    fn name(&self) -> &str;

    fn detect(&self, graph: &NetworkGraph) -> Result<Partition>;

    /// `(resolution, weighted)` used when scoring this strategy's output.
    fn modularity_settings(&self) -> (f64, bool) {
        (1.0, false)
    }
}

/// Disjoint node sets covering the graph, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    communities: Vec<Vec<String>>,
}

impl Partition {
    pub fn new(communities: Vec<Vec<String>>) -> Self {
        Self { communities }
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn communities(&self) -> &[Vec<String>] {
        &self.communities
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.communities.iter().map(Vec::len).collect()
    }

    /// Node id to community id in `[0, len)`.
    pub fn assignments(&self) -> HashMap<String, i64> {
        self.communities
            .iter()
            .enumerate()
            .flat_map(|(id, members)| members.iter().map(move |m| (m.clone(), id as i64)))
            .collect()
    }

    /// Checks that every graph node appears in exactly one community.
    pub fn validate(&self, graph: &NetworkGraph) -> Result<()> {
        let mut seen = HashSet::new();
        for members in &self.communities {
            if members.is_empty() {
                return Err(Error::InvalidPartition("empty community".into()));
            }
            for member in members {
                if graph.node_index(member).is_none() {
                    return Err(Error::InvalidPartition(format!("unknown node {member:?}")));
                }
                if !seen.insert(member.as_str()) {
                    return Err(Error::InvalidPartition(format!("node {member:?} assigned twice")));
                }
            }
        }
        if seen.len() != graph.node_count() {
            let missing = graph
                .nodes()
                .find(|n| !seen.contains(n.id.as_str()))
                .map(|n| n.id.clone())
                .unwrap_or_default();
            return Err(Error::InvalidPartition(format!("node {missing:?} not assigned")));
        }
        Ok(())
    }
}

/// Validates `partition` and stores each node's community id under `key`.
pub fn annotate(graph: &mut NetworkGraph, partition: &Partition, key: &str) -> Result<()> {
    partition.validate(graph)?;
    graph.set_node_attributes(key, &partition.assignments());
    Ok(())
}

/// Greedy modularity maximisation.
#[derive(Debug, Clone)]
pub struct GreedyModularity {
    /// Modularity resolution; values above 1 favour smaller communities.
    /// Default: 1.0
    pub resolution: f64,
    /// Use the `weight` edge attribute instead of unit weights.
    /// Default: false
    pub weighted: bool,
}

impl Default for GreedyModularity {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            weighted: false,
        }
    }
}

impl GreedyModularity {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub const fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }
}

impl CommunityDetection for GreedyModularity {
    fn name(&self) -> &str {
        "greedy-modularity"
    }

    fn modularity_settings(&self) -> (f64, bool) {
        (self.resolution, self.weighted)
    }

    fn detect(&self, graph: &NetworkGraph) -> Result<Partition> {
        let g = graph.graph();
        let n = g.node_count();
        let weights = EdgeWeights::new(graph, self.weighted);

        if weights.total == 0.0 {
            return Ok(sorted_partition(graph, (0..n).map(|i| vec![i]).collect()));
        }

        let q0 = 1.0 / (2.0 * weights.total);
        let gamma = self.resolution;
        let mut a: Vec<f64> = weights.degree.iter().map(|k| k * q0).collect();

        // dq[u][v]: modularity change from joining communities u and v.
        let mut dq: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for (&(u, v), &w) in &weights.pairs {
            if u == v {
                continue;
            }
            let gain = 2.0 * (w * q0 - gamma * a[u] * a[v]);
            dq[u].insert(v, gain);
            dq[v].insert(u, gain);
        }

        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let mut merges = 0usize;

        while let Some((gain, u, v)) = best_pair(&dq) {
            if gain < 0.0 {
                break;
            }

            let row_u = std::mem::take(&mut dq[u]);
            let row_v = std::mem::take(&mut dq[v]);
            let neighbours: Vec<usize> = row_u
                .keys()
                .chain(row_v.keys())
                .copied()
                .filter(|&w| w != u && w != v)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            let mut merged = BTreeMap::new();
            for w in neighbours {
                let value = match (row_u.get(&w), row_v.get(&w)) {
                    (Some(du), Some(dv)) => du + dv,
                    (None, Some(dv)) => dv - 2.0 * gamma * a[u] * a[w],
                    (Some(du), None) => du - 2.0 * gamma * a[v] * a[w],
                    (None, None) => continue,
                };
                merged.insert(w, value);
                dq[w].remove(&u);
                dq[w].insert(v, value);
            }
            dq[v] = merged;

            a[v] += a[u];
            a[u] = 0.0;
            let moved = std::mem::take(&mut members[u]);
            members[v].extend(moved);
            merges += 1;
        }

        debug!(merges, "greedy modularity finished");
        let communities = members.into_iter().filter(|m| !m.is_empty()).collect();
        Ok(sorted_partition(graph, communities))
    }
}

/// Largest gain; ties go to the smallest `(u, v)`.
fn best_pair(dq: &[BTreeMap<usize, f64>]) -> Option<(f64, usize, usize)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for (u, row) in dq.iter().enumerate() {
        for (&v, &gain) in row {
            if best.is_none_or(|(g, _, _)| gain > g) {
                best = Some((gain, u, v));
            }
        }
    }
    best
}

/// Connected components (Tarjan's SCC on the undirected graph).
#[derive(Debug, Clone, Default)]
pub struct ConnectedComponents;

impl CommunityDetection for ConnectedComponents {
    fn name(&self) -> &str {
        "connected-components"
    }

    fn detect(&self, graph: &NetworkGraph) -> Result<Partition> {
        let components = tarjan_scc(graph.graph())
            .into_iter()
            .map(|nodes| nodes.into_iter().map(NodeIndex::index).collect())
            .collect();
        Ok(sorted_partition(graph, components))
    }
}

/// Sorts members by insertion order and communities by size, largest first.
fn sorted_partition(graph: &NetworkGraph, mut communities: Vec<Vec<usize>>) -> Partition {
    for members in &mut communities {
        members.sort_unstable();
    }
    communities.sort_by_key(|m| m.first().copied().unwrap_or(usize::MAX));
    communities.sort_by(|a, b| b.len().cmp(&a.len()));

    let g = graph.graph();
    Partition::new(
        communities
            .into_iter()
            .map(|m| m.into_iter().map(|i| g[NodeIndex::new(i)].id.clone()).collect())
            .collect(),
    )
}

struct EdgeWeights {
    /// Summed weight per unordered node pair.
    pairs: HashMap<(usize, usize), f64>,
    /// Weighted degree; self-loops count twice.
    degree: Vec<f64>,
    total: f64,
}

impl EdgeWeights {
    fn new(graph: &NetworkGraph, weighted: bool) -> Self {
        let g = graph.graph();
        let mut pairs = HashMap::new();
        let mut degree = vec![0.0; g.node_count()];
        let mut total = 0.0;

        for edge in g.edge_references() {
            let w = if weighted {
                edge.weight().weight().unwrap_or(1.0)
            } else {
                1.0
            };
            let (s, t) = (edge.source().index(), edge.target().index());
            let key = (s.min(t), s.max(t));
            *pairs.entry(key).or_insert(0.0) += w;
            degree[s] += w;
            degree[t] += w;
            total += w;
        }

        Self { pairs, degree, total }
    }
}

/// Newman modularity of `partition` on `graph`.
pub fn modularity(
    graph: &NetworkGraph,
    partition: &Partition,
    resolution: f64,
    weighted: bool,
) -> f64 {
    let weights = EdgeWeights::new(graph, weighted);
    if weights.total == 0.0 {
        return 0.0;
    }

    let community_of: HashMap<usize, usize> = partition
        .communities()
        .iter()
        .enumerate()
        .flat_map(|(c, members)| {
            members
                .iter()
                .filter_map(|id| graph.node_index(id))
                .map(move |idx| (idx.index(), c))
        })
        .collect();

    let mut internal = vec![0.0; partition.len()];
    let mut degree_sum = vec![0.0; partition.len()];
    for (&(u, v), &w) in &weights.pairs {
        if let (Some(&cu), Some(&cv)) = (community_of.get(&u), community_of.get(&v)) {
            if cu == cv {
                internal[cu] += w;
            }
        }
    }
    for (node, &k) in weights.degree.iter().enumerate() {
        if let Some(&c) = community_of.get(&node) {
            degree_sum[c] += k;
        }
    }

    let m = weights.total;
    internal
        .iter()
        .zip(&degree_sum)
        .map(|(l, d)| l / m - resolution * (d / (2.0 * m)).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn two_triangles() -> NetworkGraph {
        let mut g = NetworkGraph::new();
        let pairs = [
            ("a", "b"),
            ("b", "c"),
            ("a", "c"),
            ("x", "y"),
            ("y", "z"),
            ("x", "z"),
            ("c", "x"),
        ];
        for (a, b) in pairs {
            g.add_edge(a, b, Edge::weighted(1.0));
        }
        g
    }

    #[test]
    fn greedy_splits_two_triangles() {
        let g = two_triangles();
        let partition = GreedyModularity::new().detect(&g).unwrap();
        partition.validate(&g).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.communities()[0], vec!["a", "b", "c"]);
        assert_eq!(partition.communities()[1], vec!["x", "y", "z"]);

        let q = modularity(&g, &partition, 1.0, false);
        assert!((q - 5.0 / 14.0).abs() < 1e-9, "modularity {q}");
    }

    #[test]
    fn greedy_keeps_isolated_nodes_as_singletons() {
        let mut g = two_triangles();
        g.add_node("lonely");
        let partition = GreedyModularity::new().detect(&g).unwrap();
        partition.validate(&g).unwrap();
        assert_eq!(partition.sizes(), vec![3, 3, 1]);
        assert_eq!(partition.communities()[2], vec!["lonely"]);
    }

    #[test]
    fn edgeless_graph_is_all_singletons() {
        let mut g = NetworkGraph::new();
        g.add_node("a");
        g.add_node("b");
        let partition = GreedyModularity::new().detect(&g).unwrap();
        assert_eq!(partition.sizes(), vec![1, 1]);
        assert_eq!(modularity(&g, &partition, 1.0, false), 0.0);
    }

    #[test]
    fn weights_change_the_result_only_when_enabled() {
        // A heavy bridge pulls c and x together in the weighted run.
        let mut g = two_triangles();
        g.add_edge("c", "x", Edge::weighted(50.0));
        let unweighted = GreedyModularity::new().detect(&g).unwrap();
        let weighted = GreedyModularity::new().with_weighted(true).detect(&g).unwrap();
        assert_eq!(unweighted.len(), 2);
        let assignments = weighted.assignments();
        assert_eq!(assignments["c"], assignments["x"]);
    }

    #[test]
    fn connected_components_groups_by_reachability() {
        let mut g = NetworkGraph::new();
        g.add_edge("a", "b", Edge::default());
        g.add_edge("c", "d", Edge::default());
        g.add_edge("d", "e", Edge::default());
        let partition = ConnectedComponents.detect(&g).unwrap();
        assert_eq!(partition.sizes(), vec![3, 2]);
        assert_eq!(partition.communities()[0], vec!["c", "d", "e"]);
    }

    #[test]
    fn annotate_assigns_every_node() {
        let mut g = two_triangles();
        let partition = GreedyModularity::new().detect(&g).unwrap();
        annotate(&mut g, &partition, COMMUNITY_KEY).unwrap();
        let ids = g.node_attributes(COMMUNITY_KEY);
        assert_eq!(ids.len(), 6);
        assert!(ids.values().all(|v| matches!(v, crate::AttrValue::Int(0 | 1))));
    }

    #[test]
    fn validate_rejects_overlap_and_gaps() {
        let g = two_triangles();
        let overlapping = Partition::new(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec!["c".into(), "x".into(), "y".into(), "z".into()],
        ]);
        assert!(matches!(overlapping.validate(&g), Err(Error::InvalidPartition(_))));

        let incomplete = Partition::new(vec![vec!["a".into(), "b".into(), "c".into()]]);
        assert!(matches!(incomplete.validate(&g), Err(Error::InvalidPartition(_))));
    }
}
