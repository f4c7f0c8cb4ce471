//! Upper-triangular to symmetric matrix conversion.
//!
//! For a triangular input `M` the result is `M + Mᵀ − diag(M)`: every
//! off-diagonal pair takes the single stored value and the diagonal is kept
//! once. Lower cells are ignored and overwritten by their upper mirror, so an
//! already-symmetric matrix comes back unchanged.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::table::AdjacencyTable;
use crate::{Error, Result};

/// Absolute tolerance when comparing mirrored cells.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Square matrix with `values[i][j] == values[j][i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SymmetricMatrix {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            (i + 1..n).all(|j| (self.values[i][j] - self.values[j][i]).abs() <= tolerance)
        })
    }
}

impl From<SymmetricMatrix> for AdjacencyTable {
    fn from(matrix: SymmetricMatrix) -> Self {
        AdjacencyTable {
            row_labels: matrix.labels.clone(),
            column_labels: matrix.labels,
            values: matrix.values,
        }
    }
}

/// Checks that the table is square with one label set, and returns the
/// values with columns reordered to follow the row labels.
pub fn validate(table: &AdjacencyTable) -> Result<Vec<Vec<f64>>> {
    if table.rows() != table.columns() {
        return Err(Error::NotSquare {
            rows: table.rows(),
            columns: table.columns(),
        });
    }

    let mut seen = HashSet::new();
    for label in &table.row_labels {
        if !seen.insert(label.as_str()) {
            return Err(Error::LabelMismatch(format!("duplicate row label {label:?}")));
        }
    }

    let column_position: HashMap<&str, usize> = table
        .column_labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    if column_position.len() != table.columns() {
        return Err(Error::LabelMismatch("duplicate column label".into()));
    }

    let order = table
        .row_labels
        .iter()
        .map(|label| {
            column_position
                .get(label.as_str())
                .copied()
                .ok_or_else(|| {
                    Error::LabelMismatch(format!("row {label:?} has no matching column"))
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok(table
        .values
        .iter()
        .map(|row| order.iter().map(|&c| row[c]).collect())
        .collect())
}

/// Mirrors the upper triangle onto the lower one.
pub fn symmetrize(table: &AdjacencyTable) -> Result<SymmetricMatrix> {
    let mut values = validate(table)?;
    let labels = table.row_labels.clone();
    let n = labels.len();

    let mut overwritten = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let upper = values[i][j];
            if values[j][i] != 0.0 && (values[j][i] - upper).abs() > SYMMETRY_TOLERANCE {
                overwritten += 1;
            }
            values[j][i] = upper;
        }
    }
    if overwritten > 0 {
        warn!(
            cells = overwritten,
            "ignored lower-triangle cells that differ from the upper triangle"
        );
    }

    debug!(size = n, "symmetrized adjacency matrix");
    Ok(SymmetricMatrix { labels, values })
}
