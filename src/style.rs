//! Visual style parameters for the force-directed view.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Every recognized style option. Unknown keys are rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub zoom: f64,
    /// Many-body strength; negative values repel.
    pub node_charge: f64,
    /// Pull towards the centre.
    pub node_gravity: f64,
    pub link_distance: f64,
    /// 0 keeps every link at `link_distance`; 1 shortens heavy links fully.
    pub link_distance_variation: f64,
    pub node_collision: bool,
    /// Keep the simulation warm so nodes never settle.
    pub wiggle_nodes: bool,
    /// Stop the simulation after the first layout.
    pub freeze_nodes: bool,
    pub node_fill_color: String,
    pub node_stroke_color: String,
    pub node_label_color: String,
    pub display_node_labels: bool,
    pub scale_node_size_by_strength: bool,
    pub node_size: f64,
    pub node_stroke_width: f64,
    pub node_size_variation: f64,
    pub link_color: String,
    pub link_width: f64,
    pub link_alpha: f64,
    pub link_width_variation: f64,
    pub display_singleton_nodes: bool,
    pub min_link_weight_percentile: f64,
    pub max_link_weight_percentile: f64,
    /// Outline of the canvas.
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            node_charge: -45.0,
            node_gravity: 0.1,
            link_distance: 15.0,
            link_distance_variation: 0.0,
            node_collision: true,
            wiggle_nodes: false,
            freeze_nodes: false,
            node_fill_color: "#79aaa0".into(),
            node_stroke_color: "#555555".into(),
            node_label_color: "#000000".into(),
            display_node_labels: false,
            scale_node_size_by_strength: false,
            node_size: 5.0,
            node_stroke_width: 1.0,
            node_size_variation: 0.5,
            link_color: "#7c7c7c".into(),
            link_width: 2.0,
            link_alpha: 0.5,
            link_width_variation: 0.5,
            display_singleton_nodes: true,
            min_link_weight_percentile: 0.0,
            max_link_weight_percentile: 1.0,
            stroke_color: "#000000".into(),
            stroke_width: 0.35,
        }
    }
}

impl StyleConfig {
    /// Style used for the community view of an adjacency matrix.
    pub fn matrix_preset() -> Self {
        Self {
            zoom: 2.0,
            wiggle_nodes: true,
            node_stroke_color: "#000000".into(),
            scale_node_size_by_strength: true,
            node_size: 10.0,
            node_stroke_width: 0.5,
            link_color: "#f8766d".into(),
            link_width: 1.0,
            link_width_variation: 1.0,
            ..Self::default()
        }
    }

    /// Style used for the plain edge-list view.
    pub fn edgelist_preset() -> Self {
        Self {
            zoom: 0.6,
            node_charge: -35.0,
            node_gravity: 0.25,
            link_distance: 30.0,
            link_distance_variation: 1.0,
            node_size: 50.0,
            ..Self::matrix_preset()
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::load(path, e))?;
        let style: Self = serde_json::from_str(&text).map_err(|e| Error::load(path, e))?;
        style.validate()?;
        Ok(style)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, color) in [
            ("node_fill_color", &self.node_fill_color),
            ("node_stroke_color", &self.node_stroke_color),
            ("node_label_color", &self.node_label_color),
            ("link_color", &self.link_color),
            ("stroke_color", &self.stroke_color),
        ] {
            if !is_hex_color(color) {
                return Err(Error::InvalidStyle(format!("{key} must be #rrggbb, got {color:?}")));
            }
        }

        for (key, value) in [
            ("zoom", self.zoom),
            ("node_charge", self.node_charge),
            ("node_gravity", self.node_gravity),
            ("link_distance", self.link_distance),
            ("link_distance_variation", self.link_distance_variation),
            ("node_size", self.node_size),
            ("node_stroke_width", self.node_stroke_width),
            ("node_size_variation", self.node_size_variation),
            ("link_width", self.link_width),
            ("link_alpha", self.link_alpha),
            ("link_width_variation", self.link_width_variation),
            ("min_link_weight_percentile", self.min_link_weight_percentile),
            ("max_link_weight_percentile", self.max_link_weight_percentile),
            ("stroke_width", self.stroke_width),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidStyle(format!("{key} must be finite, got {value}")));
            }
        }

        let (lo, hi) = (self.min_link_weight_percentile, self.max_link_weight_percentile);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(Error::InvalidStyle(format!(
                "link weight percentiles must satisfy 0 <= min <= max <= 1, got {lo} and {hi}"
            )));
        }
        if !(0.0..=1.0).contains(&self.link_alpha) {
            return Err(Error::InvalidStyle(format!(
                "link_alpha out of range: {}",
                self.link_alpha
            )));
        }
        if self.zoom <= 0.0 {
            return Err(Error::InvalidStyle(format!("zoom must be positive, got {}", self.zoom)));
        }
        if self.node_size < 0.0 || self.link_width < 0.0 {
            return Err(Error::InvalidStyle("sizes must not be negative".into()));
        }
        Ok(())
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        StyleConfig::default().validate().unwrap();
        StyleConfig::matrix_preset().validate().unwrap();
        StyleConfig::edgelist_preset().validate().unwrap();
    }

    #[test]
    fn edgelist_preset_overrides_physics() {
        let style = StyleConfig::edgelist_preset();
        assert_eq!(style.zoom, 0.6);
        assert_eq!(style.node_charge, -35.0);
        assert_eq!(style.node_size, 50.0);
        assert_eq!(style.link_color, "#f8766d");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"zoom": 3, "display_node_labels": true}"#;
        let style: StyleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(style.zoom, 3.0);
        assert!(style.display_node_labels);
        assert_eq!(style.node_size, StyleConfig::default().node_size);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(serde_json::from_str::<StyleConfig>(r##"{"node_colour": "#ffffff"}"##).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let style = StyleConfig {
            link_color: "red".into(),
            ..StyleConfig::default()
        };
        assert!(matches!(style.validate(), Err(Error::InvalidStyle(_))));

        let style = StyleConfig {
            min_link_weight_percentile: 0.8,
            max_link_weight_percentile: 0.2,
            ..StyleConfig::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let base = StyleConfig::default();
        let mut styles = vec![base.clone(); 4];
        styles[0].zoom = f64::NAN;
        styles[1].node_size = f64::NAN;
        styles[2].link_width = f64::NAN;
        styles[3].node_charge = f64::INFINITY;
        for style in styles {
            assert!(matches!(style.validate(), Err(Error::InvalidStyle(_))));
        }
        assert!(base.validate().is_ok());
    }
}
