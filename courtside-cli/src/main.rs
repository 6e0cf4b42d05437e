//! Courtside CLI - build the coaching index and ask it questions
//!
//! # Commands
//!
//! ```bash
//! # Rebuild the index from the corpus directory
//! courtside build
//!
//! # Hybrid search, optionally as JSON
//! courtside search "entry angle on a floater" -k 5 --json
//!
//! # Agentic answers (several questions run concurrently; demo set when none given)
//! courtside ask "How do I get more arc on my jump shot?"
//!
//! # Preview how a file is chunked
//! courtside chunk kb/Basketball_Knowledge_Base.pdf
//!
//! # Coaching summary from a video analysis report
//! courtside coach basketball sports.json
//! ```
//!
//! Set `RUST_LOG=debug` for retrieval internals.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use courtside_lib::{
    agent::{citation, AgentLoop},
    chunk::{ChunkMetadata, Chunker, SlidingWindowChunker},
    config::Config,
    embed::{Embedder, HashingEmbedder},
    index::{IndexBuilder, IndexStore, SnapshotHandle},
    reader::{categorize, ReaderSet},
    search::HybridRetriever,
    session::{SessionAnalysis, Sport},
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_QUESTIONS: [&str; 3] = [
    "Give layup and floater release/entry angle guidance and the form cues to improve consistency.",
    "Summarize basketball jump-shot mechanics and optimal entry angles from the wing.",
    "For soccer, when should I chip versus place across goal, and what launch angles are typical?",
];

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Hybrid retrieval and agentic answers over a sports coaching corpus")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Embedding backend
    #[arg(short, long, global = true, value_enum, default_value_t = EmbedderKind::Minilm)]
    embedder: EmbedderKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// all-MiniLM-L6-v2 via fastembed (downloads the model on first run)
    Minilm,
    /// Feature hashing, no model download
    Hashing,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the corpus directory
    Build,

    /// Hybrid search over the index
    Search {
        query: String,

        /// Number of results (defaults to the configured k)
        #[arg(short)]
        k: Option<usize>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer questions with the agent loop
    Ask {
        /// Questions to answer; a demo set is used when none are given
        questions: Vec<String>,
    },

    /// Show how a file is split into chunks
    Chunk {
        input: PathBuf,

        /// Characters shown per chunk
        #[arg(long, default_value = "200")]
        preview: usize,
    },

    /// Summarize a practice session and answer its coaching query
    Coach {
        /// basketball, soccer or tennis
        sport: String,

        /// Analysis report (JSON)
        analysis: PathBuf,
    },
}

fn load_embedder(kind: EmbedderKind) -> Result<Arc<dyn Embedder>> {
    match kind {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        #[cfg(feature = "fastembed")]
        EmbedderKind::Minilm => {
            info!("loading MiniLM model (first run downloads ~90MB)");
            Ok(Arc::new(courtside_lib::embed::MiniLmEmbedder::new()?))
        }
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Minilm => {
            anyhow::bail!("built without the fastembed feature; use --embedder hashing")
        }
    }
}

/// Load the persisted index or build it, and publish it on a fresh handle.
fn open_index(config: &Config, embedder: &dyn Embedder) -> Result<Arc<SnapshotHandle>> {
    let readers = ReaderSet::standard();
    let builder = IndexBuilder::new(config, &readers, embedder)?;
    let store = IndexStore::new(&config.index_dir);
    let handle = Arc::new(SnapshotHandle::new());
    handle
        .init(&store, &builder)
        .with_context(|| format!("opening index in {}", config.index_dir.display()))?;
    Ok(handle)
}

fn preview(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push_str("...");
    }
    out
}

fn chunk_file(config: &Config, input: &Path, max: usize) -> Result<()> {
    let readers = ReaderSet::standard();
    let chunker = SlidingWindowChunker::from_config(&config.chunking)?;
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let category = categorize(&filename, &config.categories);

    let mut count = 0;
    for item in readers.extract(input) {
        let metadata = ChunkMetadata {
            filename: filename.clone(),
            category: category.clone(),
            section: item.section,
            page: item.page,
            position: 0,
        };
        for chunk in chunker.chunk(&item.text, metadata) {
            count += 1;
            println!(
                "--- Chunk {count} ({} chars, offset {}) {} ---",
                chunk.text.chars().count(),
                chunk.metadata.position,
                citation(&chunk.metadata)
            );
            println!("{}\n", preview(&chunk.text, max));
        }
    }
    println!(
        "Chunked '{}' into {count} chunks (size {}, overlap {})",
        input.display(),
        chunker.size(),
        chunker.overlap()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build => {
            let embedder = load_embedder(cli.embedder)?;
            let readers = ReaderSet::standard();
            let builder = IndexBuilder::new(&config, &readers, embedder.as_ref())?;
            let snapshot = IndexStore::new(&config.index_dir).rebuild(&builder)?;
            println!(
                "Indexed {} chunks from {} into {}",
                snapshot.len(),
                config.corpus_dir.display(),
                config.index_dir.display()
            );
        }

        Commands::Search { query, k, json } => {
            let embedder = load_embedder(cli.embedder)?;
            let handle = open_index(&config, embedder.as_ref())?;
            let retriever = HybridRetriever::new(handle.current()?, embedder.as_ref(), &config.retrieval);
            let hits = retriever.search(&query, k.unwrap_or(config.retrieval.k))?;

            if json {
                let hits: Vec<_> = hits
                    .iter()
                    .map(|h| {
                        json!({
                            "score": h.score,
                            "origin": format!("{:?}", h.origin).to_lowercase(),
                            "chunk": h.chunk.as_ref(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                println!("Searching: '{query}'\n");
                for (i, hit) in hits.iter().enumerate() {
                    println!(
                        "#{} (score: {:.4}, {:?}) {}",
                        i + 1,
                        hit.score,
                        hit.origin,
                        citation(&hit.chunk.metadata)
                    );
                    println!("{}\n", preview(&hit.chunk.text, 300));
                }
            }
        }

        Commands::Ask { questions } => {
            let embedder = load_embedder(cli.embedder)?;
            let handle = open_index(&config, embedder.as_ref())?;
            let agent = Arc::new(AgentLoop::new(handle, embedder, &config));

            let questions = if questions.is_empty() {
                DEMO_QUESTIONS.iter().map(|q| q.to_string()).collect()
            } else {
                questions
            };

            let tasks: Vec<_> = questions
                .into_iter()
                .map(|question| {
                    let agent = Arc::clone(&agent);
                    tokio::task::spawn_blocking(move || {
                        let answer = agent.answer(&question);
                        (question, answer)
                    })
                })
                .collect();

            for task in tasks {
                let (question, answer) = task.await?;
                println!("{}", "=".repeat(80));
                println!("Q: {question}");
                println!("{}", answer?);
            }
        }

        Commands::Chunk { input, preview } => chunk_file(&config, &input, preview)?,

        Commands::Coach { sport, analysis } => {
            let sport: Sport = sport.parse()?;
            let raw = fs::read_to_string(&analysis)
                .with_context(|| format!("reading {}", analysis.display()))?;
            let session = SessionAnalysis::parse(sport, &raw)?;

            println!("{}", session.summary());

            let embedder = load_embedder(cli.embedder)?;
            let handle = open_index(&config, embedder.as_ref())?;
            let agent = AgentLoop::new(handle, embedder, &config);
            let query = session.coaching_query();
            info!(%sport, "answering coaching query");

            println!("{}", "=".repeat(80));
            println!("Coaching query: {query}\n");
            println!("{}", agent.answer(&query)?);
        }
    }

    Ok(())
}
