mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use index::{BulkInsertSink, DocumentSplitter, IngestReport, Loader, MemorySink, MongoSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "jobs-pipeline", about = "Clean, group and load job postings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw CSV and write the cleaned CSV and grouped JSON
    Prepare,
    /// Load the grouped JSON into the document store
    Load {
        /// Load into memory instead of the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Prepare, then load
    Run {
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    info!(config = %serde_json::to_string(&config)?, "Loaded configuration");

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Prepare => prepare(&config),
        Command::Load { dry_run } => load(&config, dry_run).map(|_| ()),
        Command::Run { dry_run } => {
            prepare(&config)?;
            load(&config, dry_run).map(|_| ())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jobs_pipeline=info,ingest=info,index=info".into());

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn prepare(config: &AppConfig) -> Result<()> {
    let paths = config.prepare_paths()?;
    ingest::prepare(&paths)
        .with_context(|| format!("Failed to prepare {}", paths.data_path.display()))?;
    Ok(())
}

fn load(config: &AppConfig, dry_run: bool) -> Result<IngestReport> {
    let path = &config.paths.grouped_json_path;
    let documents = index::load_documents(path)
        .with_context(|| format!("Failed to load documents from {}", path.display()))?;

    let splitter = DocumentSplitter::new(config.splitter()?)?;

    let report = if dry_run {
        let max_bytes = splitter.config().max_bytes;
        run_loader(MemorySink::new(max_bytes), splitter, documents)?
    } else {
        let sink = MongoSink::connect(&config.mongo()).context("Failed to connect to MongoDB")?;
        run_loader(sink, splitter, documents)?
    };

    if !report.failures.is_empty() {
        warn!(
            failed = report.failures.len(),
            failures = %serde_json::to_string(&report.failures)?,
            "Some documents were not inserted"
        );
    }
    Ok(report)
}

// The sink, and with it the store connection, is dropped when this returns.
fn run_loader<S: BulkInsertSink>(
    sink: S,
    splitter: DocumentSplitter,
    documents: Vec<index::RawDocument>,
) -> Result<IngestReport> {
    let mut loader = Loader::new(sink, splitter);
    let report = loader.ingest(documents).context("Load aborted")?;
    Ok(report)
}
