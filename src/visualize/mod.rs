//! Visualization adapter: turns an annotated [`NetworkGraph`] into a
//! renderable [`NetworkView`] and hands it to a [`Renderer`].
//!
//! Preparing the view is where referenced attributes are checked and where
//! the style's filters (link weight percentiles, singleton hiding) and size
//! scaling are applied. Renderers only draw what the view contains.

mod dot;
mod html;

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{AttrValue, NetworkGraph, WEIGHT_KEY};
use crate::style::StyleConfig;
use crate::{Error, Result};

pub use dot::DotRenderer;
pub use html::HtmlRenderer;

/// Category palette for node groups.
pub const GROUP_COLORS: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Smallest node size relative to `node_size` when scaling.
const MIN_SIZE_FACTOR: f64 = 0.2;

/// Which attributes drive grouping, sizing and link weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub node_group_key: Option<String>,
    pub node_size_key: Option<String>,
    pub edge_weight_key: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            node_group_key: None,
            node_size_key: None,
            edge_weight_key: WEIGHT_KEY.to_string(),
        }
    }
}

impl ViewOptions {
    pub fn grouped_by(key: impl Into<String>) -> Self {
        Self {
            node_group_key: Some(key.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub color: String,
    pub size: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewLink {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub width: f64,
}

/// Filtered, styled graph ready for drawing.
#[derive(Debug, Clone, Default)]
pub struct NetworkView {
    graph: UnGraph<ViewNode, ViewLink>,
}

impl NetworkView {
    pub fn filtered(
        graph: &NetworkGraph,
        options: &ViewOptions,
        style: &StyleConfig,
    ) -> Result<Self> {
        let source = graph.graph();

        let mut groups = Vec::with_capacity(source.node_count());
        let mut size_values = Vec::with_capacity(source.node_count());
        for node in source.node_weights() {
            let group = match &options.node_group_key {
                Some(key) => Some(required_attribute(&node.id, &node.attributes, key)?.to_string()),
                None => None,
            };
            let size_value = match &options.node_size_key {
                Some(key) => {
                    let value = required_attribute(&node.id, &node.attributes, key)?;
                    Some(value.as_f64().ok_or_else(|| Error::NonNumericAttribute {
                        node: node.id.clone(),
                        key: key.clone(),
                    })?)
                }
                None => None,
            };
            groups.push(group);
            size_values.push(size_value);
        }

        let weights: Vec<f64> = source
            .edge_weights()
            .map(|e| {
                e.attributes
                    .get(&options.edge_weight_key)
                    .and_then(AttrValue::as_f64)
                    .unwrap_or(1.0)
            })
            .collect();
        let mut sorted = weights.clone();
        sorted.sort_by(f64::total_cmp);
        let lo = percentile(&sorted, style.min_link_weight_percentile);
        let hi = percentile(&sorted, style.max_link_weight_percentile);

        let kept: Vec<(usize, usize, f64)> = source
            .edge_references()
            .zip(&weights)
            .filter(|&(_, &w)| w >= lo && w <= hi)
            .map(|(e, &w)| (e.source().index(), e.target().index(), w))
            .collect();

        let mut strength = vec![0.0; source.node_count()];
        let mut degree = vec![0usize; source.node_count()];
        for &(s, t, w) in &kept {
            strength[s] += w;
            strength[t] += w;
            degree[s] += 1;
            degree[t] += 1;
        }

        let raw_size: Vec<Option<f64>> = (0..source.node_count())
            .map(|i| match size_values[i] {
                Some(v) => Some(v),
                None if style.scale_node_size_by_strength => Some(strength[i]),
                None => None,
            })
            .collect();
        let max_raw = raw_size.iter().flatten().copied().fold(0.0, f64::max);
        let max_weight = kept.iter().map(|k| k.2.abs()).fold(0.0, f64::max);

        let mut palette: HashMap<String, &str> = HashMap::new();
        let mut view = UnGraph::new_undirected();
        let mut mapping: Vec<Option<NodeIndex>> = vec![None; source.node_count()];

        for (i, node) in source.node_weights().enumerate() {
            if !style.display_singleton_nodes && degree[i] == 0 {
                continue;
            }
            let color = match &groups[i] {
                Some(group) => {
                    let next = palette.len();
                    palette
                        .entry(group.clone())
                        .or_insert(GROUP_COLORS[next % GROUP_COLORS.len()])
                        .to_string()
                }
                None => style.node_fill_color.clone(),
            };
            let size = match raw_size[i] {
                Some(v) if max_raw > 0.0 => {
                    let scale = (v / max_raw).powf(style.node_size_variation);
                    style.node_size * scale.max(MIN_SIZE_FACTOR)
                }
                _ => style.node_size,
            };
            mapping[i] = Some(view.add_node(ViewNode {
                id: node.id.clone(),
                group: groups[i].clone(),
                color,
                size,
                strength: strength[i],
            }));
        }

        for &(s, t, w) in &kept {
            let (Some(a), Some(b)) = (mapping[s], mapping[t]) else {
                continue;
            };
            let width = if max_weight > 0.0 {
                style.link_width * (w.abs() / max_weight).powf(style.link_width_variation)
            } else {
                style.link_width
            };
            view.add_edge(
                a,
                b,
                ViewLink {
                    source: source[NodeIndex::new(s)].id.clone(),
                    target: source[NodeIndex::new(t)].id.clone(),
                    weight: w,
                    width,
                },
            );
        }

        debug!(
            nodes = view.node_count(),
            links = view.edge_count(),
            dropped_links = source.edge_count() - kept.len(),
            "prepared network view"
        );
        Ok(Self { graph: view })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ViewNode> {
        self.graph.node_weights()
    }

    pub fn links(&self) -> impl Iterator<Item = &ViewLink> {
        self.graph.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &UnGraph<ViewNode, ViewLink> {
        &self.graph
    }

    /// `{"nodes": [...], "links": [...]}` for the browser viewer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes": self.nodes().collect::<Vec<_>>(),
            "links": self.links().collect::<Vec<_>>(),
        })
    }
}

fn required_attribute<'a>(
    node: &str,
    attributes: &'a crate::graph::Attributes,
    key: &str,
) -> Result<&'a AttrValue> {
    attributes.get(key).ok_or_else(|| Error::MissingNodeAttribute {
        node: node.to_string(),
        key: key.to_string(),
    })
}

/// Linear-interpolated percentile of an ascending slice, `p` in `[0, 1]`.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let below = rank.floor() as usize;
            let above = rank.ceil() as usize;
            sorted[below] + (sorted[above] - sorted[below]) * (rank - below as f64)
        }
    }
}

/// Where a renderer left its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub path: PathBuf,
    pub opened: bool,
}

/// Draws a prepared view.
pub trait Renderer {
    fn render(&self, view: &NetworkView, style: &StyleConfig) -> Result<RenderOutput>;
}

/// Opens `path` with the platform's default handler.
pub fn open_in_viewer(path: &Path) -> Result<()> {
    let status = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", ""]).arg(path).status()?
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(path).status()?
    } else {
        Command::new("xdg-open").arg(path).status()?
    };
    if !status.success() {
        return Err(Error::Render(format!("could not open {}: {status}", path.display())));
    }
    info!(path = %path.display(), "opened visualization");
    Ok(())
}

/// Blocks until the user dismisses the viewer by pressing Enter.
pub fn wait_for_dismissal() -> Result<()> {
    eprintln!("Press Enter once you are done with the visualization...");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
