//! The shared service handle used by the query path.
//!
//! [`Finder`] bundles the three external clients with the retrieval
//! settings. It is built once at startup and shared behind an `Arc`; it
//! holds no mutable state.

use anyhow::Result;
use std::sync::Arc;

use crate::completion::{CompletionProvider, OpenAIChat};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, OpenAIEmbedder};
use crate::vector_store::{QdrantStore, VectorStore};

/// Retrieval knobs taken from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct FinderSettings {
    /// Number of nearest neighbors requested per search.
    pub search_limit: usize,
    /// Upper bound on completion calls in flight for one request.
    pub max_concurrent_completions: usize,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            search_limit: 5,
            max_concurrent_completions: 5,
        }
    }
}

impl FinderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_limit: config.vector_store.search_limit,
            max_concurrent_completions: config.server.max_concurrent_completions,
        }
    }
}

#[derive(Clone)]
pub struct Finder {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStore>,
    pub completer: Arc<dyn CompletionProvider>,
    pub settings: FinderSettings,
}

impl Finder {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completer: Arc<dyn CompletionProvider>,
        settings: FinderSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            completer,
            settings,
        }
    }

    /// Connect the OpenAI and Qdrant clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is missing or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(OpenAIEmbedder::from_config(config)?),
            Arc::new(QdrantStore::from_config(config)?),
            Arc::new(OpenAIChat::from_config(config)?),
            FinderSettings::from_config(config),
        ))
    }
}
