//! Weighted undirected graph built from a matrix or an edge list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, warn};

use crate::matrix::SymmetricMatrix;
use crate::table::{RecordTable, SOURCE_COLUMN, TARGET_COLUMN};
use crate::Result;

/// Edge attribute holding the numeric weight.
pub const WEIGHT_KEY: &str = "weight";

/// A node or edge attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl AttrValue {
    /// Interprets a CSV cell. Empty cells carry no value.
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        if let Ok(i) = cell.parse::<i64>() {
            return Some(AttrValue::Int(i));
        }
        if let Some(f) = cell.parse::<f64>().ok().filter(|f| f.is_finite()) {
            return Some(AttrValue::Float(f));
        }
        match cell {
            "true" | "True" | "TRUE" => Some(AttrValue::Bool(true)),
            "false" | "False" | "FALSE" => Some(AttrValue::Bool(false)),
            _ => Some(AttrValue::Text(cell.to_string())),
        }
    }

    /// Numeric value, if any. Non-finite floats count as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AttrValue::Int(i) => Some(i as f64),
            AttrValue::Float(f) if f.is_finite() => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Edge {
    pub attributes: Attributes,
}

impl Edge {
    pub fn weighted(weight: f64) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(WEIGHT_KEY.to_string(), AttrValue::Float(weight));
        Self { attributes }
    }

    /// Numeric `weight` attribute, if any.
    pub fn weight(&self) -> Option<f64> {
        self.attributes.get(WEIGHT_KEY).and_then(AttrValue::as_f64)
    }
}

/// Undirected graph keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    graph: UnGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// One node per label, one edge per nonzero upper-triangular cell.
    pub fn from_matrix(matrix: &SymmetricMatrix) -> Self {
        let mut network = Self::new();
        let nodes: Vec<NodeIndex> = matrix.labels().iter().map(|l| network.add_node(l)).collect();

        for (i, row) in matrix.rows().iter().enumerate() {
            for (j, &value) in row.iter().enumerate().skip(i) {
                if value != 0.0 {
                    network.graph.add_edge(nodes[i], nodes[j], Edge::weighted(value));
                }
            }
        }

        debug!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            "built graph from adjacency matrix"
        );
        network
    }

    /// Builds a graph from `source`/`target` rows; every other column becomes
    /// an edge attribute. Node-table rows are added first, keyed by
    /// `node_id_column` (first column when `None`).
    pub fn from_edgelist(
        edges: &RecordTable,
        nodes: Option<(&RecordTable, Option<&str>)>,
    ) -> Result<Self> {
        let mut network = Self::new();

        if let Some((table, id_column)) = nodes {
            let id_idx = match id_column {
                Some(name) => table.column_index(name)?,
                None => 0,
            };
            for row in &table.rows {
                let Some(id) = row.get(id_idx) else { continue };
                let idx = network.add_node(id);
                let attributes = collect_attributes(&table.headers, row, &[id_idx]);
                network.graph[idx].attributes.extend(attributes);
            }
        }

        let source_idx = edges.column_index(SOURCE_COLUMN)?;
        let target_idx = edges.column_index(TARGET_COLUMN)?;
        for row in &edges.rows {
            let (source, target) = (&row[source_idx], &row[target_idx]);
            let a = network.add_node(source);
            let b = network.add_node(target);
            let edge = Edge {
                attributes: collect_attributes(&edges.headers, row, &[source_idx, target_idx]),
            };
            if let Some(existing) = network.graph.find_edge(a, b) {
                warn!(%source, %target, "duplicate edge row, keeping the last one");
                network.graph[existing] = edge;
            } else {
                network.graph.add_edge(a, b, edge);
            }
        }

        debug!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            "built graph from edge list"
        );
        Ok(network)
    }

    /// Adds a node, returning the existing index when the id is known.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(Node {
            id: id.to_string(),
            attributes: Attributes::new(),
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Adds or replaces the edge between two existing ids.
    pub fn add_edge(&mut self, a: &str, b: &str, edge: Edge) -> EdgeIndex {
        let a = self.add_node(a);
        let b = self.add_node(b);
        self.graph.update_edge(a, b, edge)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Edges as `(source id, target id, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                e.weight(),
            )
        })
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        let edge = self.graph.find_edge(self.node_index(a)?, self.node_index(b)?)?;
        Some(&self.graph[edge])
    }

    pub fn graph(&self) -> &UnGraph<Node, Edge> {
        &self.graph
    }

    /// Sets `key` on every node listed in `values`.
    pub fn set_node_attributes<V>(&mut self, key: &str, values: &HashMap<String, V>)
    where
        V: Into<AttrValue> + Clone,
    {
        for (id, value) in values {
            if let Some(&idx) = self.index.get(id) {
                self.graph[idx]
                    .attributes
                    .insert(key.to_string(), value.clone().into());
            }
        }
    }

    /// `key` for each node that has it, by node id.
    pub fn node_attributes(&self, key: &str) -> BTreeMap<&str, &AttrValue> {
        self.graph
            .node_weights()
            .filter_map(|n| n.attributes.get(key).map(|v| (n.id.as_str(), v)))
            .collect()
    }
}

fn collect_attributes(headers: &[String], row: &[String], skip: &[usize]) -> Attributes {
    headers
        .iter()
        .zip(row)
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .filter_map(|(_, (key, cell))| AttrValue::parse(cell).map(|v| (key.clone(), v)))
        .collect()
}
