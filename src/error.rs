//! Error types for review-network.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for loading, building and rendering networks.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error outside of a file load.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table or style file could not be read.
    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Table has no header or ragged rows.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// A matrix cell is not a finite number.
    #[error("invalid number {value:?} at row {row:?}, column {column:?}")]
    InvalidNumber {
        row: String,
        column: String,
        value: String,
    },

    /// Matrix is not square.
    #[error("adjacency matrix is not square: {rows} rows, {columns} columns")]
    NotSquare { rows: usize, columns: usize },

    /// Row and column labels disagree.
    #[error("row and column labels differ: {0}")]
    LabelMismatch(String),

    /// Required column missing from a record table.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A node lacks an attribute the view refers to.
    #[error("node {node:?} has no attribute {key:?}")]
    MissingNodeAttribute { node: String, key: String },

    /// A node attribute used for sizing is not a number.
    #[error("attribute {key:?} of node {node:?} is not numeric")]
    NonNumericAttribute { node: String, key: String },

    /// Community output does not partition the node set.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// Style configuration rejected.
    #[error("invalid style: {0}")]
    InvalidStyle(String),

    /// Rendering backend failed.
    #[error("render failed: {0}")]
    Render(String),
}

impl Error {
    pub(crate) fn load(path: impl Into<PathBuf>, source: impl Into<Error>) -> Self {
        Error::Load {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }
}

/// Result type for review-network operations.
pub type Result<T> = std::result::Result<T, Error>;
