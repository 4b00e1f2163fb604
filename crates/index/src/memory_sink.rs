use bson::Document;

use crate::document::encoded_size;
use crate::sink::{BulkInsertSink, SinkError, WriteFailure};
use crate::splitter::MAX_DOCUMENT_BYTES;

/// Keeps documents in memory and enforces the same size ceiling as the
/// store. Used for dry runs.
#[derive(Debug)]
pub struct MemorySink {
    max_bytes: usize,
    documents: Vec<Document>,
}

impl MemorySink {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            documents: Vec::new(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    fn check(&self, doc: &Document) -> Result<(), String> {
        let size = encoded_size(doc).map_err(|e| e.to_string())?;
        if size > self.max_bytes {
            return Err(format!(
                "document of {size} bytes exceeds the {} byte limit",
                self.max_bytes
            ));
        }
        Ok(())
    }
}

impl BulkInsertSink for MemorySink {
    fn insert_one(&mut self, doc: Document) -> Result<(), SinkError> {
        self.check(&doc).map_err(SinkError::rejected)?;
        self.documents.push(doc);
        Ok(())
    }

    /// Unordered semantics: every valid document is kept even when
    /// others in the batch fail.
    fn insert_many(&mut self, docs: Vec<Document>) -> Result<usize, SinkError> {
        let mut inserted = 0;
        let mut failures = Vec::new();

        for (index, doc) in docs.into_iter().enumerate() {
            match self.check(&doc) {
                Ok(()) => {
                    self.documents.push(doc);
                    inserted += 1;
                }
                Err(message) => failures.push(WriteFailure {
                    index,
                    code: None,
                    message,
                }),
            }
        }

        if failures.is_empty() {
            Ok(inserted)
        } else {
            Err(SinkError::PartialBatch { inserted, failures })
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(MAX_DOCUMENT_BYTES)
    }
}
