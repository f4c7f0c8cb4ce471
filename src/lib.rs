//! Relationship networks from CSV tables.
//!
//! Two batch pipelines:
//!
//! - **matrix**: an upper-triangular adjacency matrix is symmetrized, turned
//!   into a weighted graph, partitioned by greedy modularity and rendered with
//!   nodes coloured by community.
//! - **edgelist**: node and edge tables (`from`/`to` columns) become a graph
//!   that keeps every edge column as an attribute, then rendered as is.
//!
//! Community detection ([`CommunityDetection`]) and drawing ([`Renderer`])
//! are traits, so either stage can be swapped without touching the
//! pipelines.
//!
//! ```ignore
//! use review_network::{run_matrix_pipeline, GreedyModularity, HtmlRenderer, MatrixPipelineConfig};
//!
//! let config = MatrixPipelineConfig::new("core_adjacency.csv");
//! let renderer = HtmlRenderer::new("core.html").with_open(true);
//! let report = run_matrix_pipeline(&config, &GreedyModularity::new(), &renderer)?;
//! println!("{} communities", report.communities.unwrap().count());
//! ```

pub mod community;
pub mod error;
pub mod generate;
pub mod graph;
pub mod matrix;
pub mod pipeline;
pub mod style;
pub mod table;
pub mod visualize;

pub use community::{
    annotate, modularity, CommunityDetection, ConnectedComponents, GreedyModularity, Partition,
    COMMUNITY_KEY,
};
pub use error::{Error, Result};
pub use graph::{AttrValue, Attributes, Edge, NetworkGraph, Node};
pub use matrix::{symmetrize, SymmetricMatrix};
pub use pipeline::{
    build_community_graph, run_edgelist_pipeline, run_matrix_pipeline, CommunitySummary,
    EdgelistPipelineConfig, MatrixPipelineConfig, PipelineReport,
};
pub use style::StyleConfig;
pub use table::{normalize_edges, AdjacencyTable, ColumnMapping, RecordTable};
pub use visualize::{DotRenderer, HtmlRenderer, NetworkView, RenderOutput, Renderer, ViewOptions};
