//! Sift - hybrid document retrieval
//!
//! Commands:
//! - `sift serve`: HTTP search API
//! - `sift search <QUERY>...`: one-shot search from the terminal
//! - `sift ingest <FILE>`: encode and store documents from a JSONL file
//!
//! Configuration comes from the environment (`SIFT_DATABASE_PATH`,
//! `VOYAGE_API_KEY`, `SIFT_TOKENIZER_PATH`, ...). Logs go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sift_core::search::{DEFAULT_ALPHA, DEFAULT_TOP_K};
use sift_core::{DocumentRecord, SearchConfig, SearchEngine, SearchMode, SearchParams};
use sift_server::api;

/// Sift - Hybrid Document Retrieval
#[derive(Parser)]
#[command(name = "sift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hybrid semantic + statistical document search")]
#[command(long_about = "Sift ranks documents by dense embedding similarity, sparse term overlap, or a weighted fusion of both.\n\nRequired environment: SIFT_DATABASE_PATH, VOYAGE_API_KEY, SIFT_TOKENIZER_PATH.")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP search API
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(long, env = "SIFT_PORT", default_value_t = api::DEFAULT_PORT)]
        port: u16,
    },

    /// Search from the command line
    Search {
        /// Query strings; joined with spaces before encoding
        #[arg(required = true)]
        queries: Vec<String>,
        /// Ranking mode: semantic, statistical or hybrid
        #[arg(long, default_value = "semantic")]
        mode: SearchMode,
        /// Number of documents to return (1-20)
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: i64,
        /// Semantic weight for hybrid mode (0.0-1.0)
        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Encode and store documents from a JSONL file
    Ingest {
        /// One `{doc_id, title, content, source, metadata}` object per line
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.json_logs);

    match cli.command {
        Commands::Serve { port } => run_serve(port).await,
        Commands::Search {
            queries,
            mode,
            top_k,
            alpha,
            json,
        } => run_search(queries, mode, top_k, alpha, json).await,
        Commands::Ingest { file } => run_ingest(file).await,
    }
}

/// Logs to stderr so stdout stays clean for `--json` output
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_engine() -> anyhow::Result<SearchEngine> {
    let config = SearchConfig::from_env().context("Incomplete configuration")?;
    let engine = SearchEngine::from_config(&config)?;
    Ok(engine)
}

async fn run_serve(port: u16) -> anyhow::Result<()> {
    info!("Sift v{} starting...", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(build_engine()?);
    api::serve(engine, port)
        .await
        .with_context(|| format!("Search API failed on port {}", port))
}

async fn run_search(
    queries: Vec<String>,
    mode: SearchMode,
    top_k: i64,
    alpha: f64,
    json: bool,
) -> anyhow::Result<()> {
    let engine = build_engine()?;

    let params = SearchParams {
        queries,
        search_type: mode,
        top_k,
        alpha: Some(alpha),
    };
    let result = engine.search_params(params).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", format!("=== Sift {} search ===", mode).cyan().bold());
    println!("{}: {}", "Found".white().bold(), result.total_found);
    println!();

    for (rank, doc) in result.results.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{:>2}.", rank + 1).white().bold(),
            doc.doc_id.green(),
            format!("({:.4})", doc.similarity).yellow()
        );
        if let Some(title) = doc.fields.get("title").and_then(|v| v.as_str()) {
            println!("    {}", title.bold());
        }
        if let Some(content) = doc.fields.get("content").and_then(|v| v.as_str()) {
            println!("    {}", truncate(content, 160).dimmed());
        }
    }

    Ok(())
}

async fn run_ingest(file: PathBuf) -> anyhow::Result<()> {
    let engine = build_engine()?;
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("Cannot open {}", file.display()))?,
    );

    println!("{}", "=== Sift Ingest ===".cyan().bold());

    let mut indexed = 0usize;
    let mut failed = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let doc: DocumentRecord = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(line = number + 1, "Skipping malformed document: {}", e);
                failed += 1;
                continue;
            }
        };

        match engine.index_document(&doc).await {
            Ok(()) => indexed += 1,
            Err(e) => {
                warn!(line = number + 1, "Failed to index document: {}", e);
                failed += 1;
            }
        }
    }

    println!("{}: {}", "Indexed".white().bold(), indexed.to_string().green());
    if failed > 0 {
        println!("{}: {}", "Failed".white().bold(), failed.to_string().red());
        anyhow::bail!("{} of {} documents could not be ingested", failed, indexed + failed);
    }

    Ok(())
}

/// Truncate a string for display (UTF-8 safe)
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
