//! Seeded sample inputs for both pipelines.

use std::collections::HashSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::Result;

/// Builds unique entity labels such as `forest-soil-17`.
pub struct LabelGenerator {
    topics: Vec<&'static str>,
    facets: Vec<&'static str>,
    used: HashSet<String>,
    rng: StdRng,
}

impl LabelGenerator {
    pub fn new(seed: u64) -> Self {
        LabelGenerator {
            topics: vec![
                "forest", "soil", "carbon", "water", "fire", "pest", "climate", "timber",
                "biomass", "habitat", "drought", "policy",
            ],
            facets: vec![
                "model", "survey", "review", "trial", "index", "risk", "yield", "trend",
                "network", "map",
            ],
            used: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_label(&mut self) -> String {
        loop {
            let topic = self.topics.choose(&mut self.rng).copied().unwrap_or("node");
            let facet = self.facets.choose(&mut self.rng).copied().unwrap_or("x");
            let num = self.rng.gen_range(1..1000);
            let label = format!("{topic}-{facet}-{num}");
            if self.used.insert(label.clone()) {
                return label;
            }
        }
    }

    pub fn batch(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.next_label()).collect()
    }
}

/// Writes an upper-triangular adjacency matrix. Each off-diagonal pair is
/// linked with probability `density`, weight in `1..=max_weight`.
pub fn generate_adjacency_csv(
    path: impl AsRef<Path>,
    labels: usize,
    density: f64,
    max_weight: u32,
    seed: u64,
) -> Result<()> {
    let mut generator = LabelGenerator::new(seed);
    let labels = generator.batch(labels);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let density = density.clamp(0.0, 1.0);

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(std::iter::once("").chain(labels.iter().map(String::as_str)))?;
    for (i, label) in labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        for j in 0..labels.len() {
            let cell = if j > i && rng.gen_bool(density) {
                rng.gen_range(1..=max_weight.max(1)).to_string()
            } else if j >= i {
                "0".to_string()
            } else {
                String::new()
            };
            row.push(cell);
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(path = %path.as_ref().display(), labels = labels.len(), "wrote sample adjacency matrix");
    Ok(())
}

/// Writes a node table (`id,topic`) and an edge table (`from,to,weight`).
pub fn generate_edgelist_csv(
    nodes_path: impl AsRef<Path>,
    edges_path: impl AsRef<Path>,
    nodes: usize,
    edges: usize,
    seed: u64,
) -> Result<()> {
    let mut generator = LabelGenerator::new(seed);
    let ids = generator.batch(nodes);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let mut writer = csv::Writer::from_path(nodes_path.as_ref())?;
    writer.write_record(["id", "topic"])?;
    for id in &ids {
        let topic = id.split('-').next().unwrap_or_default();
        writer.write_record([id.as_str(), topic])?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(edges_path.as_ref())?;
    writer.write_record(["from", "to", "weight"])?;
    if ids.len() >= 2 {
        for _ in 0..edges {
            let pair: Vec<&String> = ids.choose_multiple(&mut rng, 2).collect();
            let weight = rng.gen_range(1..=20u32);
            writer.write_record([pair[0].as_str(), pair[1].as_str(), weight.to_string().as_str()])?;
        }
    }
    writer.flush()?;

    info!(nodes = ids.len(), edges, "wrote sample edge list");
    Ok(())
}
