use std::path::PathBuf;
use thiserror::Error;

use crate::sink::SinkError;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode JSON from {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document cannot be encoded as BSON: {0}")]
    Bson(#[from] bson::ser::Error),

    #[error("Split chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Sink failure: {0}")]
    Sink(#[from] SinkError),
}
