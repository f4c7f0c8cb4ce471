//! review-network CLI - build, partition and draw relationship networks.
//!
//! # Usage
//!
//! ```bash
//! # Adjacency matrix -> communities -> interactive page
//! review-network matrix core_adjacency.csv -o core.html --open
//!
//! # Node and edge tables -> Graphviz image
//! review-network edgelist edges.csv --nodes nodes.csv --format dot -o net.dot --image net.png
//!
//! # Sample inputs
//! review-network generate matrix -o sample.csv --labels 40
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use review_network::generate::{generate_adjacency_csv, generate_edgelist_csv};
use review_network::{
    run_edgelist_pipeline, run_matrix_pipeline, ColumnMapping, CommunityDetection,
    ConnectedComponents, DotRenderer, EdgelistPipelineConfig, GreedyModularity, HtmlRenderer,
    MatrixPipelineConfig, PipelineReport, Renderer, StyleConfig, ViewOptions,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "review-network")]
#[command(about = "Relationship networks from CSV tables", long_about = None)]
struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upper-triangular adjacency matrix with community detection
    Matrix {
        /// Adjacency matrix CSV (header row and index column)
        input: PathBuf,

        /// Community detection algorithm
        #[arg(long, default_value = "greedy")]
        detector: DetectorKind,

        /// Use edge weights in modularity
        #[arg(long)]
        weighted: bool,

        /// Modularity resolution
        #[arg(long, default_value = "1.0")]
        resolution: f64,

        /// Node attribute that receives the community id
        #[arg(long, default_value = "community")]
        community_key: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Node and edge tables, drawn without community detection
    Edgelist {
        /// Edge table CSV
        edges: PathBuf,

        /// Node table CSV
        #[arg(long)]
        nodes: Option<PathBuf>,

        /// Node id column (defaults to the first column)
        #[arg(long)]
        node_id: Option<String>,

        /// Column holding the edge source
        #[arg(long, default_value = "from")]
        from_column: String,

        /// Column holding the edge target
        #[arg(long, default_value = "to")]
        to_column: String,

        /// Node attribute used to colour groups
        #[arg(long)]
        group_key: Option<String>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Write sample input files
    Generate {
        #[command(subcommand)]
        kind: GenerateKind,
    },
}

#[derive(Subcommand)]
enum GenerateKind {
    /// Upper-triangular adjacency matrix
    Matrix {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "30")]
        labels: usize,

        /// Probability that a pair is linked
        #[arg(long, default_value = "0.15")]
        density: f64,

        #[arg(long, default_value = "5")]
        max_weight: u32,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Node table and from/to edge table
    Edgelist {
        #[arg(long)]
        nodes_output: PathBuf,

        #[arg(long)]
        edges_output: PathBuf,

        #[arg(long, default_value = "30")]
        nodes: usize,

        #[arg(long, default_value = "60")]
        edges: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Style JSON replacing the built-in preset
    #[arg(long)]
    style: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "html")]
    format: OutputFormat,

    /// Output file (HTML page or DOT source)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// PNG rendered from the DOT file with graphviz (DOT output only)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Open the result with the system viewer
    #[arg(long)]
    open: bool,

    /// Block until the viewer is dismissed
    #[arg(long, requires = "open")]
    wait: bool,

    /// Page title
    #[arg(long, default_value = "Network")]
    title: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Html,
    Dot,
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectorKind {
    Greedy,
    Components,
}

impl RenderArgs {
    fn style(&self, preset: StyleConfig) -> Result<StyleConfig> {
        match &self.style {
            Some(path) => StyleConfig::from_path(path).context("reading style file"),
            None => Ok(preset),
        }
    }

    fn renderer(&self) -> Result<Box<dyn Renderer>> {
        match self.format {
            OutputFormat::Html => {
                if self.image.is_some() {
                    bail!("--image requires --format dot");
                }
                let output = self.output.clone().unwrap_or_else(|| "network.html".into());
                Ok(Box::new(
                    HtmlRenderer::new(output)
                        .with_title(&self.title)
                        .with_open(self.open)
                        .with_wait(self.wait),
                ))
            }
            OutputFormat::Dot => {
                let output = self.output.clone().unwrap_or_else(|| "network.dot".into());
                let mut renderer = DotRenderer::new(output).with_open(self.open);
                if let Some(image) = &self.image {
                    renderer = renderer.with_image(image);
                }
                Ok(Box::new(renderer))
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Matrix {
            input,
            detector,
            weighted,
            resolution,
            community_key,
            render,
        } => {
            let mut config = MatrixPipelineConfig::new(&input);
            config.style = render.style(StyleConfig::matrix_preset())?;
            config.view = ViewOptions::grouped_by(&community_key);
            config.community_key = community_key;

            let detector: Box<dyn CommunityDetection> = match detector {
                DetectorKind::Greedy => Box::new(
                    GreedyModularity::new()
                        .with_resolution(resolution)
                        .with_weighted(weighted),
                ),
                DetectorKind::Components => Box::new(ConnectedComponents),
            };

            let renderer = render.renderer()?;
            let report = run_matrix_pipeline(&config, detector.as_ref(), renderer.as_ref())
                .with_context(|| format!("matrix pipeline failed for {}", input.display()))?;
            print_report(&report);
        }

        Commands::Edgelist {
            edges,
            nodes,
            node_id,
            from_column,
            to_column,
            group_key,
            render,
        } => {
            let mut config = EdgelistPipelineConfig::new(&edges);
            config.nodes_path = nodes;
            config.node_id_column = node_id;
            config.columns = ColumnMapping {
                source: from_column,
                target: to_column,
            };
            config.style = render.style(StyleConfig::edgelist_preset())?;
            config.view.node_group_key = group_key;

            let renderer = render.renderer()?;
            let report = run_edgelist_pipeline(&config, renderer.as_ref())
                .with_context(|| format!("edgelist pipeline failed for {}", edges.display()))?;
            print_report(&report);
        }

        Commands::Generate { kind } => match kind {
            GenerateKind::Matrix {
                output,
                labels,
                density,
                max_weight,
                seed,
            } => {
                generate_adjacency_csv(&output, labels, density, max_weight, seed)
                    .with_context(|| format!("writing {}", output.display()))?;
                println!("Wrote {}", output.display());
            }
            GenerateKind::Edgelist {
                nodes_output,
                edges_output,
                nodes,
                edges,
                seed,
            } => {
                generate_edgelist_csv(&nodes_output, &edges_output, nodes, edges, seed)
                    .context("writing sample edge list")?;
                println!("Wrote {} and {}", nodes_output.display(), edges_output.display());
            }
        },
    }

    info!("done");
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("Nodes:       {}", report.node_count);
    println!("Edges:       {}", report.edge_count);
    if let Some(communities) = &report.communities {
        let sizes: Vec<String> = communities.sizes.iter().map(|s| s.to_string()).collect();
        println!("Communities: {} ({})", communities.count(), communities.algorithm);
        println!("Sizes:       {}", sizes.join(", "));
        println!("Modularity:  {:.4}", communities.modularity);
    }
    println!("Output:      {}", report.output.path.display());
}
