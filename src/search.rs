//! Natural-language workflow search.
//!
//! A query is embedded, matched against the vector store, and each match is
//! turned into a [`WorkflowCard`] with a generated description. Description
//! calls run concurrently, at most `max_concurrent_completions` at a time,
//! and the cards keep the store's best-first order.

use anyhow::Result;
use futures::stream::{self, StreamExt};

use crate::completion::{generate, PromptKind};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, OpenAIEmbedder};
use crate::error::RequestError;
use crate::finder::Finder;
use crate::models::{Difficulty, ScoredPoint, WorkflowCard};
use crate::vector_store::{QdrantStore, VectorStore};

const UNTITLED: &str = "Untitled Workflow";
const DEFAULT_TRIGGER: &str = "Manual Trigger";
const MAX_SERVICES: usize = 4;

/// Embed `query` and return the nearest stored points, best first.
///
/// No descriptions are generated. Used by `wfind search` and as the first
/// half of [`search_workflows`].
pub async fn find_matches(
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    query: &str,
    limit: usize,
) -> Result<Vec<ScoredPoint>> {
    let vector = embedder.embed(query).await?;
    let mut hits = store.search(&vector, limit).await?;
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    Ok(hits)
}

/// Search for workflows matching a free-text description.
///
/// # Errors
///
/// [`RequestError::InvalidInput`] for an empty query (no downstream call is
/// made); [`RequestError::Upstream`] if embedding or the vector search fails.
/// Description failures do not fail the search; they fall back to a
/// templated sentence.
pub async fn search_workflows(finder: &Finder, query: &str) -> Result<Vec<WorkflowCard>, RequestError> {
    if query.is_empty() {
        return Err(RequestError::invalid("Query is required and must be a string"));
    }

    let hits = find_matches(
        finder.embedder.as_ref(),
        finder.store.as_ref(),
        query,
        finder.settings.search_limit,
    )
    .await?;
    tracing::debug!(query, matches = hits.len(), "vector search complete");

    let completer = finder.completer.as_ref();
    let cards = stream::iter(hits.into_iter().enumerate())
        .map(|(index, hit)| async move {
            let title = display_title(&hit);
            let nodes = hit.payload.nodes.clone().unwrap_or_default();
            let description = generate(completer, PromptKind::Description, &title, &nodes).await;
            to_card(index, hit, title, nodes, description)
        })
        .buffered(finder.settings.max_concurrent_completions.max(1))
        .collect::<Vec<_>>()
        .await;

    Ok(cards)
}

/// Run `wfind search`: print the raw matches without generated text.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.is_empty() {
        anyhow::bail!("search query must not be empty");
    }
    let embedder = OpenAIEmbedder::from_config(config)?;
    let store = QdrantStore::from_config(config)?;
    let limit = limit.unwrap_or(config.vector_store.search_limit);

    let hits = find_matches(&embedder, &store, query, limit).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "#{}  {}  (score {:.4})",
            i + 1,
            display_title(hit),
            hit.score
        );
        if let Some(nodes) = hit.payload.nodes.as_ref().filter(|n| !n.is_empty()) {
            println!("    nodes: {}", nodes.join(", "));
        }
        if let Some(url) = &hit.payload.file_url {
            println!("    url: {}", url);
        }
        println!("    id: {}", hit.id);
    }
    Ok(())
}

fn display_title(hit: &ScoredPoint) -> String {
    hit.payload
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn to_card(
    index: usize,
    hit: ScoredPoint,
    title: String,
    nodes: Vec<String>,
    description: String,
) -> WorkflowCard {
    let id = if hit.id.is_empty() {
        format!("workflow-{}", index)
    } else {
        hit.id
    };

    WorkflowCard {
        id,
        name: title,
        description,
        trigger: nodes
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
        services: nodes.iter().take(MAX_SERVICES).cloned().collect(),
        difficulty: Difficulty::from_score(hit.score),
        node_count: nodes.len(),
        score: hit.score,
        file_url: hit.payload.file_url,
        file_type: hit.payload.file_type,
        nodes,
    }
}
