use std::path::PathBuf;
use std::process::Command;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeReference, NodeIndex, UnGraph};
use tracing::info;

use super::{open_in_viewer, NetworkView, RenderOutput, Renderer, ViewLink, ViewNode};
use crate::style::StyleConfig;
use crate::{Error, Result};

/// Graphviz export. With `image` set, runs `dot -Tpng` on the written file.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    pub output: PathBuf,
    pub image: Option<PathBuf>,
    pub open: bool,
}

impl DotRenderer {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            image: None,
            open: false,
        }
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub const fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn source(&self, view: &NetworkView, style: &StyleConfig) -> String {
        let alpha = (style.link_alpha * 255.0).round() as u8;
        let edge_attrs = |_: &UnGraph<ViewNode, ViewLink>, edge: EdgeReference<'_, ViewLink>| {
            let link = edge.weight();
            format!("color=\"{}{:02x}\", penwidth={:.3}", style.link_color, alpha, link.width)
        };
        let node_attrs = |_: &UnGraph<ViewNode, ViewLink>, (_, node): (NodeIndex, &ViewNode)| {
            let label = if style.display_node_labels { node.id.as_str() } else { "" };
            format!(
                "label=\"{}\", tooltip=\"{}\", style=filled, fillcolor=\"{}\", color=\"{}\", \
                 penwidth={}, width={:.3}, fontcolor=\"{}\"",
                escape(label),
                escape(&node.id),
                node.color,
                style.node_stroke_color,
                style.node_stroke_width,
                node.size / 36.0,
                style.node_label_color,
            )
        };
        let dot = Dot::with_attr_getters(
            view.graph(),
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &edge_attrs,
            &node_attrs,
        );
        format!("{dot:?}")
    }
}

impl Renderer for DotRenderer {
    fn render(&self, view: &NetworkView, style: &StyleConfig) -> Result<RenderOutput> {
        std::fs::write(&self.output, self.source(view, style))?;
        info!(path = %self.output.display(), "wrote DOT file");

        let Some(image) = &self.image else {
            return Ok(RenderOutput {
                path: self.output.clone(),
                opened: false,
            });
        };

        let status = Command::new("dot")
            .arg("-Tpng")
            .arg(&self.output)
            .arg("-o")
            .arg(image)
            .status()
            .map_err(|e| Error::Render(format!("failed to run graphviz `dot`: {e}")))?;
        if !status.success() {
            return Err(Error::Render(format!("`dot` exited with {status}")));
        }
        info!(path = %image.display(), "rendered image");

        if self.open {
            open_in_viewer(image)?;
        }
        Ok(RenderOutput {
            path: image.clone(),
            opened: self.open,
        })
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NetworkGraph};
    use crate::visualize::ViewOptions;

    #[test]
    fn dot_source_is_undirected_with_colors() {
        let mut g = NetworkGraph::new();
        g.add_edge("a", "b", Edge::weighted(2.0));
        let style = StyleConfig::default();
        let view = NetworkView::filtered(&g, &ViewOptions::default(), &style).unwrap();

        let source = DotRenderer::new("unused.dot").source(&view, &style);
        assert!(source.starts_with("graph {"));
        assert!(source.contains("0 -- 1"));
        assert!(source.contains("fillcolor=\"#79aaa0\""));
        assert!(source.contains("tooltip=\"a\""));
        assert!(source.contains("color=\"#7c7c7c80\""));
    }

    #[test]
    fn dot_source_has_no_graphviz_weight() {
        let mut g = NetworkGraph::new();
        g.add_edge("a", "b", Edge::weighted(-0.25));
        let style = StyleConfig::default();
        let view = NetworkView::filtered(&g, &ViewOptions::default(), &style).unwrap();

        let source = DotRenderer::new("unused.dot").source(&view, &style);
        assert!(source.contains("penwidth="));
        assert!(!source.contains("weight="));
    }

    #[test]
    fn writes_dot_file_without_image() {
        let mut g = NetworkGraph::new();
        g.add_edge("a", "b", Edge::weighted(1.0));
        let style = StyleConfig::default();
        let view = NetworkView::filtered(&g, &ViewOptions::default(), &style).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.dot");
        let out = DotRenderer::new(&path).render(&view, &style).unwrap();
        assert_eq!(out.path, path);
        assert!(std::fs::read_to_string(&path).unwrap().contains("--"));
    }
}
