//! CSV table loading and edge-column normalization.
//!
//! Two table shapes are read:
//!
//! - [`AdjacencyTable`]: a labelled numeric matrix. The header row holds an
//!   (optional) index name followed by column labels, every data row starts
//!   with its row label.
//! - [`RecordTable`]: a plain headered table of string cells, used for node
//!   and edge lists.

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::{Error, Result};

/// Canonical name of the edge source column.
pub const SOURCE_COLUMN: &str = "source";
/// Canonical name of the edge target column.
pub const TARGET_COLUMN: &str = "target";

/// Labelled numeric matrix as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// Row-major cell values, `values[row][column]`.
    pub values: Vec<Vec<f64>>,
}

impl AdjacencyTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| Error::load(path, e))?;
        let table = Self::from_csv(reader).map_err(|e| Error::load(path, e))?;
        debug!(path = %path.display(), rows = table.row_labels.len(), "loaded adjacency table");
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(ReaderBuilder::new().has_headers(true).from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(Error::MalformedTable("empty header row".into()));
        }
        let column_labels: Vec<String> =
            headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

        let mut row_labels = Vec::new();
        let mut values = Vec::new();
        for record in reader.records() {
            let record = record?;
            let label = record.get(0).unwrap_or_default().trim().to_string();
            let mut row = Vec::with_capacity(column_labels.len());
            for (column, cell) in column_labels.iter().zip(record.iter().skip(1)) {
                row.push(parse_cell(&label, column, cell)?);
            }
            row_labels.push(label);
            values.push(row);
        }

        Ok(Self {
            row_labels,
            column_labels,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn columns(&self) -> usize {
        self.column_labels.len()
    }

    /// First `n` rows rendered as text, for logging.
    pub fn preview(&self, n: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\t{}", self.column_labels.join("\t"));
        for (label, row) in self.row_labels.iter().zip(&self.values).take(n) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(out, "{}\t{}", label, cells.join("\t"));
        }
        out
    }
}

fn parse_cell(row: &str, column: &str, cell: &str) -> Result<f64> {
    let cell = cell.trim();
    // Blank cells are the unused lower triangle.
    if cell.is_empty() {
        return Ok(0.0);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidNumber {
            row: row.to_string(),
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}

/// Headered table of string cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| Error::load(path, e))?;
        let table = Self::from_csv(reader).map_err(|e| Error::load(path, e))?;
        debug!(path = %path.display(), rows = table.rows.len(), "loaded record table");
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(ReaderBuilder::new().has_headers(true).from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() {
            return Err(Error::MalformedTable("empty header row".into()));
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(|c| c.trim().to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Renames columns in place. Names not present are skipped.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for header in &mut self.headers {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from == header) {
                *header = to.to_string();
            }
        }
    }
}

/// Which edge-table columns hold the endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            source: "from".into(),
            target: "to".into(),
        }
    }
}

/// Renames the mapped endpoint columns to `source` / `target`.
pub fn normalize_edges(mut table: RecordTable, mapping: &ColumnMapping) -> Result<RecordTable> {
    table.rename_columns(&[
        (mapping.source.as_str(), SOURCE_COLUMN),
        (mapping.target.as_str(), TARGET_COLUMN),
    ]);
    table.column_index(SOURCE_COLUMN)?;
    table.column_index(TARGET_COLUMN)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_indexed_matrix() {
        let csv = ",A,B,C\nA,0,1,0\nB,,0,2\nC,,,0\n";
        let table = AdjacencyTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.row_labels, vec!["A", "B", "C"]);
        assert_eq!(table.column_labels, vec!["A", "B", "C"]);
        assert_eq!(table.values[0], vec![0.0, 1.0, 0.0]);
        assert_eq!(table.values[1], vec![0.0, 0.0, 2.0]);
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let csv = ",A,B\nA,0,x\nB,0,0\n";
        let err = AdjacencyTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { ref value, .. } if value == "x"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let csv = ",A,B\nA,0,1\nB,0\n";
        assert!(AdjacencyTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = AdjacencyTable::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn preview_limits_rows() {
        let csv = ",A,B\nA,0,1\nB,0,0\n";
        let table = AdjacencyTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.preview(1).lines().count(), 2);
    }

    #[test]
    fn normalizes_from_to_columns() {
        let csv = "from,to,weight\nX,Y,5\n";
        let table = RecordTable::from_reader(csv.as_bytes()).unwrap();
        let table = normalize_edges(table, &ColumnMapping::default()).unwrap();
        assert_eq!(table.headers, vec!["source", "target", "weight"]);
        assert_eq!(table.rows[0], vec!["X", "Y", "5"]);
    }

    #[test]
    fn canonical_columns_pass_through() {
        let csv = "source,target\nX,Y\n";
        let table = RecordTable::from_reader(csv.as_bytes()).unwrap();
        assert!(normalize_edges(table, &ColumnMapping::default()).is_ok());
    }

    #[test]
    fn missing_endpoint_column_fails() {
        let csv = "from,weight\nX,5\n";
        let table = RecordTable::from_reader(csv.as_bytes()).unwrap();
        let err = normalize_edges(table, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "target"));
    }
}
