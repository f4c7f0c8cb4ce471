//! End-to-end runs: load, build, (detect), prepare view, render.

use std::path::PathBuf;

use tracing::info;

use crate::community::{annotate, modularity, CommunityDetection, Partition, COMMUNITY_KEY};
use crate::graph::NetworkGraph;
use crate::matrix::symmetrize;
use crate::style::StyleConfig;
use crate::table::{normalize_edges, AdjacencyTable, ColumnMapping, RecordTable};
use crate::visualize::{NetworkView, RenderOutput, Renderer, ViewOptions};
use crate::Result;

/// Rows of the matrix logged after loading and symmetrizing.
const PREVIEW_ROWS: usize = 5;

/// Inputs for the adjacency-matrix pipeline.
#[derive(Debug, Clone)]
pub struct MatrixPipelineConfig {
    pub adjacency_path: PathBuf,
    /// Node attribute receiving the community id.
    pub community_key: String,
    pub style: StyleConfig,
    pub view: ViewOptions,
}

impl MatrixPipelineConfig {
    pub fn new(adjacency_path: impl Into<PathBuf>) -> Self {
        Self {
            adjacency_path: adjacency_path.into(),
            community_key: COMMUNITY_KEY.to_string(),
            style: StyleConfig::matrix_preset(),
            view: ViewOptions::grouped_by(COMMUNITY_KEY),
        }
    }
}

/// Inputs for the edge-list pipeline.
#[derive(Debug, Clone)]
pub struct EdgelistPipelineConfig {
    pub edges_path: PathBuf,
    pub nodes_path: Option<PathBuf>,
    /// Node-table id column; the first column when `None`.
    pub node_id_column: Option<String>,
    pub columns: ColumnMapping,
    pub style: StyleConfig,
    pub view: ViewOptions,
}

impl EdgelistPipelineConfig {
    pub fn new(edges_path: impl Into<PathBuf>) -> Self {
        Self {
            edges_path: edges_path.into(),
            nodes_path: None,
            node_id_column: None,
            columns: ColumnMapping::default(),
            style: StyleConfig::edgelist_preset(),
            view: ViewOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommunitySummary {
    pub algorithm: String,
    pub sizes: Vec<usize>,
    pub modularity: f64,
}

impl CommunitySummary {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub communities: Option<CommunitySummary>,
    pub output: RenderOutput,
}

/// Loads and symmetrizes the matrix, builds the graph and annotates
/// communities. Returns the graph with the partition it was annotated with.
pub fn build_community_graph(
    table: &AdjacencyTable,
    detector: &dyn CommunityDetection,
    community_key: &str,
) -> Result<(NetworkGraph, Partition)> {
    let matrix = symmetrize(table)?;
    info!("symmetric matrix:\n{}", AdjacencyTable::from(matrix.clone()).preview(PREVIEW_ROWS));

    let mut graph = NetworkGraph::from_matrix(&matrix);
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "built graph");

    let partition = detector.detect(&graph)?;
    info!(algorithm = detector.name(), communities = partition.len(), "detected communities");

    annotate(&mut graph, &partition, community_key)?;
    Ok((graph, partition))
}

pub fn run_matrix_pipeline(
    config: &MatrixPipelineConfig,
    detector: &dyn CommunityDetection,
    renderer: &dyn Renderer,
) -> Result<PipelineReport> {
    config.style.validate()?;

    let table = AdjacencyTable::from_path(&config.adjacency_path)?;
    info!("adjacency table:\n{}", table.preview(PREVIEW_ROWS));

    let (graph, partition) = build_community_graph(&table, detector, &config.community_key)?;
    let (resolution, weighted) = detector.modularity_settings();
    let q = modularity(&graph, &partition, resolution, weighted);
    info!(modularity = q, "partition quality");

    let view = NetworkView::filtered(&graph, &config.view, &config.style)?;
    let output = renderer.render(&view, &config.style)?;

    Ok(PipelineReport {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        communities: Some(CommunitySummary {
            algorithm: detector.name().to_string(),
            sizes: partition.sizes(),
            modularity: q,
        }),
        output,
    })
}

pub fn run_edgelist_pipeline(
    config: &EdgelistPipelineConfig,
    renderer: &dyn Renderer,
) -> Result<PipelineReport> {
    config.style.validate()?;

    let nodes = config.nodes_path.as_ref().map(RecordTable::from_path).transpose()?;
    let edges = RecordTable::from_path(&config.edges_path)?;
    let edges = normalize_edges(edges, &config.columns)?;

    let graph = NetworkGraph::from_edgelist(
        &edges,
        nodes.as_ref().map(|n| (n, config.node_id_column.as_deref())),
    )?;
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "built graph");

    let view = NetworkView::filtered(&graph, &config.view, &config.style)?;
    let output = renderer.render(&view, &config.style)?;

    Ok(PipelineReport {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        communities: None,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::{ConnectedComponents, GreedyModularity};
    use crate::visualize::HtmlRenderer;

    #[test]
    fn matrix_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("adjacency.csv");
        std::fs::write(&input, ",A,B,C,D\nA,0,1,1,0\nB,,0,1,0\nC,,,0,0\nD,,,,0\n").unwrap();
        let output = dir.path().join("out.html");

        let config = MatrixPipelineConfig::new(&input);
        let renderer = HtmlRenderer::new(&output);
        let report = run_matrix_pipeline(&config, &GreedyModularity::new(), &renderer).unwrap();

        assert_eq!(report.node_count, 4);
        assert_eq!(report.edge_count, 3);
        let communities = report.communities.unwrap();
        assert_eq!(communities.sizes, vec![3, 1]);
        assert_eq!(report.output.path, output);
        assert!(output.exists());
    }

    #[test]
    fn build_community_graph_annotates_nodes() {
        let csv = ",A,B,C\nA,0,1,0\nB,0,0,2\nC,0,0,0\n";
        let table = AdjacencyTable::from_reader(csv.as_bytes()).unwrap();
        let (graph, partition) =
            build_community_graph(&table, &ConnectedComponents, "group").unwrap();
        assert_eq!(partition.len(), 1);
        assert_eq!(graph.node_attributes("group").len(), 3);
    }

    #[test]
    fn edgelist_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = dir.path().join("nodes.csv");
        let edges = dir.path().join("edges.csv");
        std::fs::write(&nodes, "id,label\nX,x\nY,y\nZ,z\n").unwrap();
        std::fs::write(&edges, "from,to,weight\nX,Y,5\n").unwrap();
        let output = dir.path().join("out.html");

        let mut config = EdgelistPipelineConfig::new(&edges);
        config.nodes_path = Some(nodes);
        let report = run_edgelist_pipeline(&config, &HtmlRenderer::new(&output)).unwrap();

        assert_eq!(report.node_count, 3);
        assert_eq!(report.edge_count, 1);
        assert!(report.communities.is_none());
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let config = MatrixPipelineConfig::new("/no/such/adjacency.csv");
        let renderer = HtmlRenderer::new("/tmp/unused.html");
        let err = run_matrix_pipeline(&config, &GreedyModularity::new(), &renderer).unwrap_err();
        assert!(matches!(err, crate::Error::Load { .. }));
    }
}
