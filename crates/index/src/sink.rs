use bson::Document;
use serde::Serialize;
use thiserror::Error;

/// One rejected document inside a batch insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteFailure {
    /// Position of the document within the submitted batch.
    pub index: usize,
    pub code: Option<i32>,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    /// The store refused this document (or batch); the next one may succeed.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// Some documents of a batch were written, others were not.
    #[error("{} of {} documents failed: {}", .failures.len(), .inserted + .failures.len(), summarize(.failures))]
    PartialBatch {
        inserted: usize,
        failures: Vec<WriteFailure>,
    },

    /// The store cannot be reached at all; continuing is pointless.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl SinkError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SinkError::Unavailable { .. })
    }
}

fn summarize(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("#{} {}", f.index, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Destination for store documents.
pub trait BulkInsertSink {
    fn insert_one(&mut self, doc: Document) -> Result<(), SinkError>;

    /// Insert a batch. On partial failure the documents that made it stay
    /// written.
    fn insert_many(&mut self, docs: Vec<Document>) -> Result<usize, SinkError>;
}

impl<S: BulkInsertSink + ?Sized> BulkInsertSink for &mut S {
    fn insert_one(&mut self, doc: Document) -> Result<(), SinkError> {
        (**self).insert_one(doc)
    }

    fn insert_many(&mut self, docs: Vec<Document>) -> Result<usize, SinkError> {
        (**self).insert_many(docs)
    }
}
