use bson::Document;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure as MongoWriteFailure};
use mongodb::options::InsertManyOptions;
use mongodb::sync::{Client, Collection};
use tracing::info;

use crate::sink::{BulkInsertSink, SinkError, WriteFailure};

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub auth_source: String,
    pub collection: String,
}

impl MongoConfig {
    pub fn uri(&self) -> String {
        let credentials = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!("{user}:{password}@"),
            (Some(user), None) => format!("{user}@"),
            _ => String::new(),
        };
        format!(
            "mongodb://{}{}:{}/?authSource={}",
            credentials, self.host, self.port, self.auth_source
        )
    }
}

pub struct MongoSink {
    // Held so the connection lives exactly as long as the sink
    _client: Client,
    collection: Collection<Document>,
}

impl MongoSink {
    pub fn connect(config: &MongoConfig) -> Result<Self, SinkError> {
        let client = Client::with_uri_str(config.uri()).map_err(classify)?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            collection = %config.collection,
            "Document store sink ready"
        );
        Ok(Self {
            _client: client,
            collection,
        })
    }
}

impl BulkInsertSink for MongoSink {
    fn insert_one(&mut self, doc: Document) -> Result<(), SinkError> {
        self.collection
            .insert_one(doc, None)
            .map(|_| ())
            .map_err(classify)
    }

    fn insert_many(&mut self, docs: Vec<Document>) -> Result<usize, SinkError> {
        let total = docs.len();
        // Unordered so one bad part does not stop the rest of the batch
        let options = InsertManyOptions::builder().ordered(false).build();

        let err = match self.collection.insert_many(docs, options) {
            Ok(result) => return Ok(result.inserted_ids.len()),
            Err(err) => err,
        };

        if let ErrorKind::BulkWrite(failure) = err.kind.as_ref() {
            let failures: Vec<WriteFailure> = failure
                .write_errors
                .iter()
                .flatten()
                .map(|e| WriteFailure {
                    index: e.index,
                    code: Some(e.code),
                    message: e.message.clone(),
                })
                .collect();
            if !failures.is_empty() {
                return Err(SinkError::PartialBatch {
                    inserted: total.saturating_sub(failures.len()),
                    failures,
                });
            }
            // Only a write concern error: durability of the batch is unknown
            return Err(SinkError::rejected(err.to_string()));
        }
        Err(classify(err))
    }
}

fn classify(err: MongoError) -> SinkError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::Authentication { .. }
        | ErrorKind::DnsResolve { .. } => SinkError::Unavailable {
            reason: err.to_string(),
        },
        ErrorKind::Write(MongoWriteFailure::WriteError(e)) => {
            SinkError::rejected(format!("code {}: {}", e.code, e.message))
        }
        _ => SinkError::rejected(err.to_string()),
    }
}
