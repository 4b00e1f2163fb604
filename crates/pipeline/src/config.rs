use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use index::{MongoConfig, SplitPolicy, SplitterConfig, DEFAULT_CHUNK_SIZE, MAX_DOCUMENT_BYTES};
use serde::Serialize;

/// Everything the pipeline reads from the environment, resolved once at
/// startup.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub paths: PathConfig,
    pub store: StoreConfig,
    pub splitter: SplitConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathConfig {
    pub data_path: Option<PathBuf>,
    pub cleaned_csv_path: Option<PathBuf>,
    pub grouped_json_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: String,
    pub auth_source: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitConfig {
    pub max_bytes: usize,
    pub chunk_size: usize,
    pub policy: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or("MONGO_PORT", "27017");
        let max_bytes = or("MAX_DOCUMENT_BYTES", &MAX_DOCUMENT_BYTES.to_string());
        let chunk_size = or("SPLIT_CHUNK_SIZE", &DEFAULT_CHUNK_SIZE.to_string());

        Ok(Self {
            paths: PathConfig {
                data_path: get("DATA_PATH").map(PathBuf::from),
                cleaned_csv_path: get("CLEANED_CSV_PATH").map(PathBuf::from),
                grouped_json_path: PathBuf::from(or("GROUPED_JSON_PATH", "data/grouped_data.json")),
            },
            store: StoreConfig {
                host: or("MONGO_HOST", "localhost"),
                port: port
                    .parse()
                    .with_context(|| format!("MONGO_PORT is not a valid port: {port}"))?,
                user: get("MONGO_DB_USER"),
                password: get("MONGO_DB_PASSWORD"),
                database: or("MONGO_DB", "jobs"),
                auth_source: or("MONGO_AUTH_SOURCE", "admin"),
                collection: or("MONGO_COLLECTION", "linkedin_jobs"),
            },
            splitter: SplitConfig {
                max_bytes: max_bytes
                    .parse()
                    .with_context(|| format!("MAX_DOCUMENT_BYTES is not a number: {max_bytes}"))?,
                chunk_size: chunk_size
                    .parse()
                    .with_context(|| format!("SPLIT_CHUNK_SIZE is not a number: {chunk_size}"))?,
                policy: or("SPLIT_POLICY", "first"),
            },
        })
    }

    pub fn prepare_paths(&self) -> Result<ingest::PreparePaths> {
        Ok(ingest::PreparePaths {
            data_path: self
                .paths
                .data_path
                .clone()
                .context("DATA_PATH must be set for the prepare stage")?,
            cleaned_csv_path: self
                .paths
                .cleaned_csv_path
                .clone()
                .context("CLEANED_CSV_PATH must be set for the prepare stage")?,
            grouped_json_path: self.paths.grouped_json_path.clone(),
        })
    }

    pub fn mongo(&self) -> MongoConfig {
        MongoConfig {
            host: self.store.host.clone(),
            port: self.store.port,
            user: self.store.user.clone(),
            password: self.store.password.clone(),
            database: self.store.database.clone(),
            auth_source: self.store.auth_source.clone(),
            collection: self.store.collection.clone(),
        }
    }

    pub fn splitter(&self) -> Result<SplitterConfig> {
        let policy: SplitPolicy = self
            .splitter
            .policy
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid SPLIT_POLICY")?;

        Ok(SplitterConfig {
            max_bytes: self.splitter.max_bytes,
            chunk_size: self.splitter.chunk_size,
            policy,
        })
    }
}
