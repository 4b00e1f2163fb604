use std::fs;
use std::path::Path;

use bson::Document;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{IndexError, Result};

pub const TITLE_FIELD: &str = "title";
pub const LIST_FIELD: &str = "list_data";
/// Field holding a title's postings when loading a grouped JSON object.
pub const POSTINGS_FIELD: &str = "postings";

/// A record as it arrives at the load boundary, before it is shaped into a
/// store document.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDocument {
    Scalar(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl RawDocument {
    /// Bare strings and lists are wrapped so every record becomes a mapping.
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            RawDocument::Scalar(title) => {
                let mut map = Map::new();
                map.insert(TITLE_FIELD.to_string(), Value::String(title));
                map
            }
            RawDocument::List(items) => {
                let mut map = Map::new();
                map.insert(LIST_FIELD.to_string(), Value::Array(items));
                map
            }
            RawDocument::Map(map) => map,
        }
    }

    pub fn into_document(self) -> Result<Document> {
        to_document(&self.into_map())
    }
}

impl TryFrom<Value> for RawDocument {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(RawDocument::Scalar(s)),
            Value::Array(items) => Ok(RawDocument::List(items)),
            Value::Object(map) => Ok(RawDocument::Map(map)),
            other => Err(other),
        }
    }
}

impl From<&str> for RawDocument {
    fn from(title: &str) -> Self {
        RawDocument::Scalar(title.to_string())
    }
}

pub fn to_document(map: &Map<String, Value>) -> Result<Document> {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.insert(key.clone(), bson::to_bson(value)?);
    }
    Ok(doc)
}

/// Byte length of the BSON encoding, the figure the store checks against
/// its ceiling.
pub fn encoded_size(doc: &Document) -> Result<usize> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf)?;
    Ok(buf.len())
}

/// Read documents from a JSON file.
///
/// A top-level array yields one document per element. A top-level object
/// (the grouped output of the prepare stage) yields one `{title, postings}`
/// document per entry. Elements that are neither string, list nor mapping
/// are skipped with a warning.
pub fn load_documents(path: &Path) -> Result<Vec<RawDocument>> {
    let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let documents = documents_from_json(value);
    debug!(path = %path.display(), documents = documents.len(), "Loaded documents");
    Ok(documents)
}

pub fn documents_from_json(value: Value) -> Vec<RawDocument> {
    match value {
        Value::Object(groups) => groups
            .into_iter()
            .map(|(title, postings)| {
                let mut map = Map::new();
                map.insert(TITLE_FIELD.to_string(), Value::String(title));
                map.insert(POSTINGS_FIELD.to_string(), postings);
                RawDocument::Map(map)
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match RawDocument::try_from(item) {
                Ok(doc) => Some(doc),
                Err(other) => {
                    warn!(index, value = %other, "Skipping element that is not a document");
                    None
                }
            })
            .collect(),
        other => match RawDocument::try_from(other) {
            Ok(doc) => vec![doc],
            Err(other) => {
                warn!(value = %other, "Input holds no documents");
                Vec::new()
            }
        },
    }
}
