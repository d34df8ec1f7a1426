//! StudyForge CLI
//!
//! Runs a study session from the command line:
//! 1. Loads configuration and initializes observability
//! 2. Uploads the given documents into an in-memory index
//! 3. Runs one command (status, context, ask or exam)

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studyforge_assistant::script::{unconfigured_model, ReplyScript};
use studyforge_assistant::{telemetry, StudySession};
use studyforge_common::{
    config::AppConfig, embeddings::HashEmbedder, index::InMemoryIndex, llm::ChatModel,
    models::Metadata, VERSION,
};
use studyforge_exam::{Difficulty, ExamConfig, ExamPhase};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "studyforge", author, version, about = "Study assistant over your own documents", long_about = None)]
struct Args {
    /// Configuration file (defaults to the layered config/ lookup)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Documents or directories to upload before running the command
    #[arg(short, long = "doc", global = true)]
    docs: Vec<PathBuf>,

    /// Reply script used in place of a model service
    #[arg(long, global = true)]
    replies: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show session status after uploading
    Status,

    /// Print the context assembled for a query
    Context {
        query: String,

        /// Token budget (defaults to the budget for the query kind)
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Answer one or more questions in order
    Ask {
        #[arg(required = true)]
        questions: Vec<String>,
    },

    /// Generate a practice exam
    Exam {
        #[arg(long, default_value_t = 5)]
        multiple_choice: u32,

        #[arg(long, default_value_t = 5)]
        true_false: u32,

        #[arg(long, default_value_t = 3)]
        short_answer: u32,

        #[arg(long, default_value_t = 2)]
        essay: u32,

        /// easy, medium, hard or expert
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,

        /// Print the answer key instead of the question sheet
        #[arg(long)]
        answer_key: bool,

        /// Print the exam as JSON
        #[arg(long)]
        json: bool,
    },
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

    // Initialize observability
    telemetry::init_tracing(&config.observability);
    telemetry::init_metrics(&config.observability)?;

    info!("Starting StudyForge v{}", VERSION);

    let model: Arc<dyn ChatModel> = match &args.replies {
        Some(path) => Arc::new(ReplyScript::from_file(path)?.into_model()),
        None => Arc::new(unconfigured_model()),
    };
    let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::default())));

    let mut session = StudySession::new(&config, index, model)?.with_exam_phase_callback(
        Arc::new(|phase: ExamPhase| info!(?phase, "Exam progress")),
    );

    for path in expand_paths(&args.docs, &config.ingestion.supported_extensions)? {
        match session.upload_document(&path, &Metadata::new()).await {
            Ok(record) => info!(
                filename = %record.filename,
                passages = record.passage_count,
                "Uploaded"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Upload failed"),
        }
    }

    match args.command {
        Command::Status => {
            let status = session.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            for document in session.documents() {
                println!(
                    "{}  {}  {} passages",
                    document.document_id, document.filename, document.passage_count
                );
            }
        }

        Command::Context { query, budget } => {
            let assembler = session.assembler();
            let budget = budget.unwrap_or_else(|| assembler.budget_for(assembler.classify(&query)));
            let context = assembler.build_context(&query, budget).await?;

            println!("{}", context.content);
            println!("\nSources: {}", context.sources.join(", "));
        }

        Command::Ask { questions } => {
            for question in questions {
                let answer = session.ask(&question).await?;
                println!("Q: {}\n\n{}", question, answer.answer);
                if !answer.sources.is_empty() {
                    println!("\nSources: {}", answer.sources.join(", "));
                }
                println!();
            }
        }

        Command::Exam {
            multiple_choice,
            true_false,
            short_answer,
            essay,
            difficulty,
            answer_key,
            json,
        } => {
            let exam_config =
                ExamConfig::new(multiple_choice, true_false, short_answer, essay, difficulty);
            let generated = session.generate_exam(&exam_config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&generated.exam)?);
            } else if answer_key {
                println!("{}", generated.answer_key);
            } else {
                println!("{}", generated.questions_only);
            }
        }
    }

    Ok(())
}

/// Files as given; directories expand to their supported files, sorted
fn expand_paths(paths: &[PathBuf], extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let supported = |path: &Path| {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    };

    let mut expanded = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && supported(p))
                .collect();
            files.sort();
            expanded.extend(files);
        } else {
            expanded.push(path.clone());
        }
    }
    Ok(expanded)
}
