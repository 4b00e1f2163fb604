use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRecord {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Input table has no '{0}' column")]
    MissingColumn(String),

    /// Raised when a non-null zip code cannot be read as a number.
    #[error("Row {row}: zip_code {value} is not a number")]
    InvalidZipCode { row: usize, value: String },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
