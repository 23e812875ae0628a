//! Ingestion pipeline orchestration.
//!
//! Coordinates the indexing flow: walk → load → summarize → embed → store.
//! Files are processed one at a time. A file that fails to load, embed or
//! store is logged and skipped; the run continues. Failing to prepare the
//! collection or to traverse the directory aborts the run.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::{Config, DedupMode};
use crate::embedding::{EmbeddingProvider, OpenAIEmbedder};
use crate::models::{IndexedPoint, PointPayload, WorkflowContent, WorkflowFile};
use crate::summary::{load_workflow, summarize, truncate_chars};
use crate::vector_store::{CollectionStatus, QdrantStore, VectorStore};
use crate::walker::{file_url, walk_workflows};

/// Settings for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Raw-content base used to build each point's `file_url`.
    pub raw_base_url: Option<String>,
    pub dims: usize,
    pub max_embed_chars: usize,
    pub dedup: DedupMode,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            raw_base_url: config.raw_base_url().map(str::to_string),
            dims: config.vector_store.dims,
            max_embed_chars: config.ingest.max_embed_chars,
            dedup: config.ingest.dedup,
        }
    }
}

/// A file that was found but not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Files with a recognized extension.
    pub found: usize,
    pub stored: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Index every workflow file below `root`.
///
/// # Errors
///
/// Returns an error if the embedder's dimensions differ from
/// `options.dims`, the collection cannot be created, or the directory
/// cannot be traversed. Per-file failures are recorded in the report.
pub async fn ingest_directory(
    root: &Path,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    options: &IngestOptions,
) -> Result<IngestReport> {
    if embedder.dims() != options.dims {
        anyhow::bail!(
            "Embedding model {} returns {} dimensions but the collection expects {}",
            embedder.model_name(),
            embedder.dims(),
            options.dims
        );
    }
    tracing::info!(model = %embedder.model_name(), dims = options.dims, "ingest started");

    match store
        .ensure_collection(options.dims)
        .await
        .context("Failed to prepare vector collection")?
    {
        CollectionStatus::Created => tracing::info!(dims = options.dims, "collection created"),
        CollectionStatus::AlreadyExists => tracing::debug!("collection already exists"),
    }

    let mut report = IngestReport::default();

    for entry in walk_workflows(root)? {
        let file = entry.context("Failed to walk workflow directory")?;
        report.found += 1;

        match index_file(&file.relative_path, load_workflow(&file), embedder, store, options).await {
            Ok(()) => {
                tracing::debug!(path = %file.relative_path, "stored");
                report.stored += 1;
            }
            Err(e) => {
                tracing::warn!(path = %file.relative_path, error = %format!("{:#}", e), "skipping file");
                report.skipped.push(SkippedFile {
                    relative_path: file.relative_path,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    Ok(report)
}

async fn index_file(
    relative_path: &str,
    loaded: Result<WorkflowFile>,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    options: &IngestOptions,
) -> Result<()> {
    let workflow = loaded?;
    let (id, payload) = point_fields(&workflow, options)?;
    let summary = summarize(&workflow);
    let vector = embedder
        .embed(truncate_chars(&summary, options.max_embed_chars))
        .await
        .with_context(|| format!("Failed to embed {}", relative_path))?;

    let point = IndexedPoint {
        id,
        vector,
        payload,
    };
    store
        .upsert_point(&point)
        .await
        .with_context(|| format!("Failed to store {}", relative_path))
}

/// Id and payload for a loaded file, built before it is embedded.
///
/// `nodes` is set only for workflow exports; `file_url` only when a
/// raw-content base is configured.
fn point_fields(
    workflow: &WorkflowFile,
    options: &IngestOptions,
) -> Result<(String, PointPayload)> {
    let nodes = match &workflow.content {
        WorkflowContent::Structured { .. } => Some(workflow.node_types().to_vec()),
        WorkflowContent::Text { .. } => None,
    };
    let file_url = options
        .raw_base_url
        .as_deref()
        .map(|base| file_url(base, &workflow.relative_path))
        .transpose()?;

    let payload = PointPayload {
        title: Some(workflow.title.clone()),
        file_type: Some(workflow.file_type),
        nodes,
        file_url,
    };
    Ok((point_id(workflow, options.dedup), payload))
}

fn point_id(workflow: &WorkflowFile, dedup: DedupMode) -> String {
    match dedup {
        DedupMode::AlwaysInsert => Uuid::new_v4().to_string(),
        DedupMode::ContentHash => {
            Uuid::new_v5(&Uuid::NAMESPACE_OID, workflow.content_hash.as_bytes()).to_string()
        }
    }
}

/// Run `wfind ingest`.
pub async fn run_ingest(config: &Config, root: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let root = root.unwrap_or_else(|| config.ingest.root.clone());

    if dry_run {
        let report = scan_directory(&root, |_, _| {})?;
        println!("ingest {} (dry-run)", root.display());
        println!("  files found: {}", report.found);
        println!("  would store: {}", report.stored);
        print_skipped(&report.skipped);
        return Ok(());
    }

    let embedder = OpenAIEmbedder::from_config(config)?;
    let store = QdrantStore::from_config(config)?;
    let options = IngestOptions::from_config(config);
    if options.raw_base_url.is_none() {
        tracing::warn!("GITHUB_RAW_REFS_BASE not set; points will have no file_url");
    }

    let report = ingest_directory(&root, &embedder, &store, &options).await?;

    println!("ingest {}", root.display());
    println!("  collection: {}", config.vector_store.collection);
    println!("  files found: {}", report.found);
    println!("  stored: {}", report.stored);
    println!("  skipped: {}", report.skipped.len());
    print_skipped(&report.skipped);
    println!("ok");
    Ok(())
}

/// Run `wfind summarize`: print each file's title and embedding input.
pub fn run_summarize(config: &Config, root: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.ingest.root.clone());
    let max_chars = config.ingest.max_embed_chars;

    let report = scan_directory(&root, |workflow, summary| {
        println!("== {} ({})", workflow.relative_path, workflow.file_type.as_str());
        println!("title: {}", workflow.title);
        println!("{}", truncate_chars(summary, max_chars));
        println!();
    })?;

    println!("files: {}, skipped: {}", report.found, report.skipped.len());
    print_skipped(&report.skipped);
    Ok(())
}

/// Walk and summarize without calling any service.
///
/// `stored` counts the files that would be embedded.
fn scan_directory<F>(root: &Path, mut on_summary: F) -> Result<IngestReport>
where
    F: FnMut(&WorkflowFile, &str),
{
    let mut report = IngestReport::default();
    for entry in walk_workflows(root)? {
        let file = entry.context("Failed to walk workflow directory")?;
        report.found += 1;
        match load_workflow(&file) {
            Ok(workflow) => {
                on_summary(&workflow, &summarize(&workflow));
                report.stored += 1;
            }
            Err(e) => report.skipped.push(SkippedFile {
                relative_path: file.relative_path,
                reason: format!("{:#}", e),
            }),
        }
    }
    Ok(report)
}

fn print_skipped(skipped: &[SkippedFile]) {
    for s in skipped {
        println!("  skip {}: {}", s.relative_path, s.reason);
    }
}
