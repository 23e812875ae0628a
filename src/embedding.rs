//! Embedding provider abstraction and the OpenAI implementation.
//!
//! Defines the [`EmbeddingProvider`] trait used by ingestion and search,
//! and [`OpenAIEmbedder`], which calls `POST {api_base}/embeddings`.
//!
//! Exactly one request is made per text. Transport errors, non-success
//! statuses and malformed responses all propagate to the caller; the
//! provider never retries.
//!
//! Also provides [`cosine_similarity`], used by the in-memory vector store.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::{status_error, UpstreamError};

const SERVICE: &str = "OpenAI embeddings";

/// Trait for embedding providers.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// request handlers behind an `Arc`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text into a vector of [`dims`](Self::dims) floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns the model identifier (e.g. `"text-embedding-3-large"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `3072`).
    fn dims(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding provider using the OpenAI API (or any compatible endpoint).
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAIEmbedder {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dims: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            dims,
        })
    }

    /// Create an embedder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.openai.api_base,
            config.openai_api_key()?,
            config.openai.embedding_model.clone(),
            config.vector_store.dims,
            Duration::from_secs(config.openai.timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await.into());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::decode(SERVICE, "empty data array"))?
            .embedding;

        if embedding.len() != self.dims {
            return Err(UpstreamError::DimensionMismatch {
                expected: self.dims,
                actual: embedding.len(),
            }
            .into());
        }

        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors
/// of different lengths, or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
