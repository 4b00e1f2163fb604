pub mod document;
pub mod error;
pub mod memory_sink;
pub mod mongo_sink;
pub mod sink;
pub mod splitter;

pub use document::{load_documents, RawDocument};
pub use error::{IndexError, Result};
pub use memory_sink::MemorySink;
pub use mongo_sink::{MongoConfig, MongoSink};
pub use sink::{BulkInsertSink, SinkError, WriteFailure};
pub use splitter::{
    split_if_oversized, DocumentSplitter, SplitPolicy, SplitterConfig, DEFAULT_CHUNK_SIZE,
    MAX_DOCUMENT_BYTES,
};

use serde::Serialize;
use tracing::{error, info, warn};

/// Loads documents into a sink, splitting the ones that are too large.
pub struct Loader<S> {
    sink: S,
    splitter: DocumentSplitter,
}

impl<S: BulkInsertSink> Loader<S> {
    pub fn new(sink: S, splitter: DocumentSplitter) -> Self {
        Self { sink, splitter }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Insert every document, continuing past per-document failures.
    ///
    /// Only a fatal sink error (store unreachable) stops the run early.
    pub fn ingest(&mut self, documents: Vec<RawDocument>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (index, raw) in documents.into_iter().enumerate() {
            report.documents += 1;

            match self.load_one(raw) {
                Ok(outcome) => report.record(outcome),
                Err(IndexError::Sink(err)) if err.is_fatal() => {
                    error!(index, error = %err, "Store unavailable, aborting load");
                    return Err(IndexError::Sink(err));
                }
                Err(err) => {
                    let inserted = match &err {
                        IndexError::Sink(SinkError::PartialBatch { inserted, failures }) => {
                            for failure in failures {
                                warn!(
                                    index,
                                    part = failure.index,
                                    code = ?failure.code,
                                    message = %failure.message,
                                    "Bulk write error"
                                );
                            }
                            *inserted
                        }
                        _ => 0,
                    };
                    warn!(index, error = %err, "Error inserting document");
                    report.parts_inserted += inserted;
                    report.failures.push(DocumentFailure {
                        index,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            documents = report.documents,
            inserted_whole = report.inserted_whole,
            split = report.split_documents,
            parts = report.parts_inserted,
            failed = report.failures.len(),
            "Finished loading documents"
        );
        Ok(report)
    }

    fn load_one(&mut self, raw: RawDocument) -> Result<LoadOutcome> {
        let doc = raw.into_document()?;

        let size = document::encoded_size(&doc)?;
        if size <= self.splitter.config().max_bytes {
            self.sink.insert_one(doc)?;
            return Ok(LoadOutcome::Whole);
        }

        info!(size, "Splitting oversized document");
        let parts = self.splitter.split_measured(doc, size)?;
        let inserted = self.sink.insert_many(parts)?;
        info!(parts = inserted, "Inserted split parts of an oversized document");
        Ok(LoadOutcome::Split { parts: inserted })
    }
}

enum LoadOutcome {
    Whole,
    Split { parts: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    /// Position of the document in the input sequence.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub inserted_whole: usize,
    pub split_documents: usize,
    pub parts_inserted: usize,
    pub failures: Vec<DocumentFailure>,
}

impl IngestReport {
    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Whole => self.inserted_whole += 1,
            LoadOutcome::Split { parts } => {
                self.split_documents += 1;
                self.parts_inserted += parts;
            }
        }
    }

    pub fn succeeded(&self) -> usize {
        self.documents - self.failures.len()
    }
}

/// Load `documents` into `sink` with the default splitter settings.
pub fn ingest<S: BulkInsertSink>(documents: Vec<RawDocument>, sink: S) -> Result<IngestReport> {
    Loader::new(sink, DocumentSplitter::default()).ingest(documents)
}
