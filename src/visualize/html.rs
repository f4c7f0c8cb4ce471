use std::path::PathBuf;

use tracing::info;

use super::{open_in_viewer, wait_for_dismissal, NetworkView, RenderOutput, Renderer};
use crate::style::StyleConfig;
use crate::Result;

const TEMPLATE: &str = include_str!("../../assets/viewer.html");

/// Self-contained force-directed page driven by d3-force.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    pub output: PathBuf,
    pub title: String,
    /// Open the page in the system browser.
    pub open: bool,
    /// Block until the viewer is dismissed. Only applies when `open` is set.
    pub wait: bool,
}

impl HtmlRenderer {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            title: "Network".into(),
            open: false,
            wait: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub const fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub const fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// The page as a string.
    pub fn page(&self, view: &NetworkView, style: &StyleConfig) -> Result<String> {
        let data = serde_json::to_string(&view.to_json())?;
        let config = serde_json::to_string(style)?;
        Ok(TEMPLATE
            .replace("__TITLE__", &escape_html(&self.title))
            .replace("__CONFIG__", &escape_script(&config))
            .replace("__DATA__", &escape_script(&data)))
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, view: &NetworkView, style: &StyleConfig) -> Result<RenderOutput> {
        std::fs::write(&self.output, self.page(view, style)?)?;
        info!(path = %self.output.display(), nodes = view.node_count(), "wrote interactive view");

        if self.open {
            open_in_viewer(&self.output)?;
            if self.wait {
                wait_for_dismissal()?;
            }
        }

        Ok(RenderOutput {
            path: self.output.clone(),
            opened: self.open,
        })
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// JSON embedded in <script> must not close the tag.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}
