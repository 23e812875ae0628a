//! # Workflow Finder CLI (`wfind`)
//!
//! Indexes a directory of n8n workflow exports into a vector store and serves
//! semantic search over them.
//!
//! ## Usage
//!
//! ```bash
//! wfind --config ./config/wfind.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wfind ingest` | Summarize, embed and store every workflow file |
//! | `wfind search "<query>"` | Print the nearest stored workflows |
//! | `wfind serve` | Start the HTTP API |
//! | `wfind probe` | Check a running server's health and search endpoints |
//! | `wfind summarize` | Print the summaries that would be embedded |
//!
//! ## Examples
//!
//! ```bash
//! # Preview what will be indexed, without calling any service
//! wfind ingest --root ../n8n-master-workflows --dry-run
//!
//! # Index for real (needs OPENAI_API_KEY and a reachable Qdrant)
//! wfind ingest
//!
//! wfind search "scrape google maps into a sheet" --limit 3
//! wfind serve
//! wfind probe --url http://localhost:3001
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use workflow_finder::{config, ingest, probe, search, server};

/// Semantic search over a library of n8n workflows.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults; environment variables (and a `.env`
/// file) override either.
#[derive(Parser)]
#[command(
    name = "wfind",
    about = "Workflow finder: index n8n workflows and search them in plain language",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/wfind.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every `.json` and `.txt` file under the workflow directory.
    ///
    /// Creates the collection if needed, then summarizes, embeds and stores
    /// each file. Files that fail are reported and skipped.
    Ingest {
        /// Workflow directory. Defaults to `[ingest].root`.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Walk and summarize only; no API calls.
        #[arg(long)]
        dry_run: bool,
    },

    /// Embed a query and print the nearest stored workflows.
    Search {
        query: String,

        /// Number of matches. Defaults to `[vector_store].search_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Call `/api/health` and `/api/search` on a running server.
    Probe {
        #[arg(long, default_value = "http://localhost:3001")]
        url: String,

        #[arg(long, default_value = "email notification workflow")]
        query: String,
    },

    /// Print each workflow file's title and summary.
    Summarize {
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command reports.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,workflow_finder=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Probe talks to a running server and needs no local config.
    if let Commands::Probe { url, query } = &cli.command {
        return probe::run_probe(url, query).await;
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { root, dry_run } => {
            ingest::run_ingest(&cfg, root, dry_run).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Summarize { root } => {
            ingest::run_summarize(&cfg, root)?;
        }
        Commands::Probe { .. } => {}
    }

    Ok(())
}
