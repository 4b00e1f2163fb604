use bson::{Bson, Document};
use tracing::{debug, warn};

use crate::document::encoded_size;
use crate::error::{IndexError, Result};

/// Largest document the store accepts, one byte under its nominal 16 MiB
/// ceiling.
pub const MAX_DOCUMENT_BYTES: usize = 16_793_598;
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

const EMPTY_DOCUMENT_BYTES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// Split only the first oversized list field, in document order.
    #[default]
    FirstOversizedField,
    /// Emit parts for every oversized list field, one field at a time.
    AllOversizedFields,
}

impl std::str::FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(SplitPolicy::FirstOversizedField),
            "all" => Ok(SplitPolicy::AllOversizedFields),
            other => Err(format!("unknown split policy '{other}' (expected 'first' or 'all')")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub max_bytes: usize,
    pub chunk_size: usize,
    pub policy: SplitPolicy,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_DOCUMENT_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            policy: SplitPolicy::default(),
        }
    }
}

pub struct DocumentSplitter {
    config: SplitterConfig,
}

impl DocumentSplitter {
    pub fn new(config: SplitterConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(IndexError::InvalidChunkSize);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Returns `[doc]` when it already fits. Otherwise cuts oversized list
    /// fields into contiguous parts that share every other field.
    ///
    /// A document that is too large without any oversized list field comes
    /// back unchanged; the store will reject it.
    pub fn split_if_oversized(&self, doc: Document) -> Result<Vec<Document>> {
        let size = encoded_size(&doc)?;
        self.split_measured(doc, size)
    }

    /// [`Self::split_if_oversized`] for a document whose encoded size is
    /// already known.
    pub fn split_measured(&self, doc: Document, size: usize) -> Result<Vec<Document>> {
        let max_bytes = self.config.max_bytes;
        if size <= max_bytes {
            return Ok(vec![doc]);
        }

        let mut parts = Vec::new();
        for (key, value) in &doc {
            let Bson::Array(items) = value else {
                continue;
            };

            let base = without_field(&doc, key);
            let base_size = encoded_size(&base)?;
            // `{key: value}` alone costs the element plus an empty document's 5 bytes
            if size.saturating_sub(base_size) + EMPTY_DOCUMENT_BYTES <= max_bytes {
                continue;
            }

            let before = parts.len();
            // Smaller chunks only help when the rest of the document fits.
            let refinable = base_size < max_bytes;
            self.push_chunks(&base, key, items, self.config.chunk_size, refinable, &mut parts)?;
            debug!(
                field = %key,
                elements = items.len(),
                parts = parts.len() - before,
                "Split oversized field"
            );

            if self.config.policy == SplitPolicy::FirstOversizedField {
                break;
            }
        }

        if parts.is_empty() {
            warn!(
                size,
                max_bytes,
                "Oversized document has no splittable list field"
            );
            return Ok(vec![doc]);
        }
        Ok(parts)
    }

    fn push_chunks(
        &self,
        base: &Document,
        field: &str,
        items: &[Bson],
        chunk_size: usize,
        refinable: bool,
        out: &mut Vec<Document>,
    ) -> Result<()> {
        for chunk in items.chunks(chunk_size) {
            let mut part = base.clone();
            part.insert(field, Bson::Array(chunk.to_vec()));

            if refinable && chunk.len() > 1 && encoded_size(&part)? > self.config.max_bytes {
                let half = chunk.len().div_ceil(2);
                self.push_chunks(base, field, chunk, half, refinable, out)?;
            } else {
                out.push(part);
            }
        }
        Ok(())
    }
}

fn without_field(doc: &Document, field: &str) -> Document {
    doc.iter()
        .filter(|(key, _)| key.as_str() != field)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl Default for DocumentSplitter {
    fn default() -> Self {
        Self {
            config: SplitterConfig::default(),
        }
    }
}

/// Split with the default policy.
pub fn split_if_oversized(doc: Document, max_bytes: usize, chunk_size: usize) -> Result<Vec<Document>> {
    DocumentSplitter::new(SplitterConfig {
        max_bytes,
        chunk_size,
        policy: SplitPolicy::default(),
    })?
    .split_if_oversized(doc)
}
