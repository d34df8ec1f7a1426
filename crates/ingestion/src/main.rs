//! StudyForge Ingest
//!
//! Runs documents through validation, extraction and chunking, indexes them
//! into an in-memory index and reports what was produced:
//! 1. Loads configuration
//! 2. Ingests each file or directory argument
//! 3. Prints one report per document (optionally with its passages)

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use studyforge_common::{
    config::AppConfig, embeddings::HashEmbedder, index::InMemoryIndex, models::Metadata,
    VectorIndex, VERSION,
};
use studyforge_ingestion::{IngestReport, IngestionProcessor};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ingest", version, about = "Chunk documents and report the resulting passages")]
struct Args {
    /// Files or directories to ingest
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to the layered config/ lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Print every passage
    #[arg(long)]
    passages: bool,

    /// Emit JSON reports
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting StudyForge Ingest v{}", VERSION);

    let embedder = Arc::new(HashEmbedder::default());
    let index = Arc::new(InMemoryIndex::new(embedder));
    let processor = IngestionProcessor::from_config(&config, index.clone())?;
    let metadata = Metadata::new();

    let mut reports: Vec<IngestReport> = Vec::new();
    let mut failures = 0usize;

    for path in &args.paths {
        if path.is_dir() {
            let report = processor.ingest_directory(path, &metadata).await?;
            failures += report.failed.len();
            for (failed, e) in &report.failed {
                eprintln!("{}: {}", failed.display(), e);
            }
            reports.extend(report.ingested);
            continue;
        }

        match processor.ingest_file(path, &metadata).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!(
                "{}: {} passages, {} characters, {} pages, backend {}",
                report.filename,
                report.passage_count,
                report.character_count,
                report
                    .page_count
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                report.backend.as_deref().unwrap_or("-"),
            );
        }
    }

    if args.passages {
        for report in &reports {
            let prepared = processor.prepare_file(std::path::Path::new(&report.source), &metadata)?;
            for passage in prepared.passages {
                println!(
                    "\n--- {} #{} ({} chars)\n{}",
                    report.filename,
                    passage
                        .metadata
                        .get("chunk_id")
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                    passage.char_len(),
                    passage.content
                );
            }
        }
    }

    info!(
        documents = reports.len(),
        failures,
        passages = index.count().await?,
        "Ingestion complete"
    );

    if failures > 0 && reports.is_empty() {
        anyhow::bail!("no documents could be ingested");
    }
    Ok(())
}
