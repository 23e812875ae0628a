//! Fake providers shared by unit tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::finder::{Finder, FinderSettings};
use crate::models::{FileType, IndexedPoint, PointPayload, ScoredPoint};
use crate::vector_store::{CollectionStatus, VectorStore};

/// Embeds every text to the same vector; optionally fails.
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail: false,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![1.0])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("OpenAI embeddings API error 401: invalid api key");
        }
        Ok(self.vector.clone())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dims(&self) -> usize {
        self.vector.len()
    }
}

/// Returns a preset list of hits regardless of the query vector.
pub struct ScriptedStore {
    pub hits: Vec<ScoredPoint>,
    pub searches: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(hits: Vec<ScoredPoint>) -> Self {
        Self {
            hits,
            searches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn ensure_collection(&self, _dims: usize) -> Result<CollectionStatus> {
        Ok(CollectionStatus::AlreadyExists)
    }

    async fn upsert_point(&self, _point: &IndexedPoint) -> Result<()> {
        Ok(())
    }

    async fn search(&self, _vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

/// Answers every prompt with `reply`, tracking call count and peak concurrency.
pub struct RecordingCompleter {
    pub reply: Option<String>,
    pub delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingCompleter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompleter {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("completion service unavailable"),
        }
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

pub fn hit(id: &str, score: f32, title: &str, nodes: &[&str]) -> ScoredPoint {
    ScoredPoint {
        id: id.to_string(),
        score,
        payload: PointPayload {
            title: Some(title.to_string()),
            file_type: Some(FileType::Json),
            nodes: Some(nodes.iter().map(|s| s.to_string()).collect()),
            file_url: Some(format!("https://raw.example.com/{}.json", id)),
        },
    }
}

pub fn finder(
    embedder: Arc<FixedEmbedder>,
    store: Arc<dyn VectorStore>,
    completer: Arc<RecordingCompleter>,
) -> Finder {
    Finder::new(embedder, store, completer, FinderSettings::default())
}
