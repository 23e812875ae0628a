//! Vector store abstraction.
//!
//! The [`VectorStore`] trait covers the three operations the finder needs:
//! creating the collection, writing a point, and nearest-neighbor search.
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | [`QdrantStore`] | Qdrant REST API (`/collections/...`) |
//! | [`InMemoryVectorStore`] | brute-force cosine over a `Vec`, for tests |

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;

use crate::config::Config;
use crate::embedding::cosine_similarity;
use crate::error::{status_error, UpstreamError};
use crate::models::{IndexedPoint, PointPayload, ScoredPoint};

const SERVICE: &str = "Qdrant";

/// Outcome of [`VectorStore::ensure_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with cosine distance and `dims`-sized vectors.
    ///
    /// An existing collection is not an error.
    async fn ensure_collection(&self, dims: usize) -> Result<CollectionStatus>;

    /// Write one point. A point with the same id is replaced.
    async fn upsert_point(&self, point: &IndexedPoint) -> Result<()>;

    /// Return up to `limit` points nearest to `vector`, best first.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;
}

// ============ Qdrant ============

/// Qdrant point ids are either UUID strings or unsigned integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointId {
    Num(u64),
    Uuid(String),
}

impl PointId {
    fn into_string(self) -> String {
        match self {
            PointId::Num(n) => n.to_string(),
            PointId::Uuid(s) => s,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: [&'a IndexedPoint; 1],
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<PointPayload>,
}

/// Client for a Qdrant collection over its REST API.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantStore {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            collection: collection.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.vector_store.url,
            config.vector_store.api_key.clone(),
            config.vector_store.collection.clone(),
            Duration::from_secs(config.vector_store.timeout_secs),
        )
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match &self.api_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dims: usize) -> Result<CollectionStatus> {
        let body = json!({ "vectors": { "size": dims, "distance": "Cosine" } });
        let response = self
            .request(reqwest::Method::PUT, self.collection_url(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(CollectionStatus::Created);
        }
        if status == StatusCode::CONFLICT {
            return Ok(CollectionStatus::AlreadyExists);
        }
        Err(status_error(SERVICE, response).await.into())
    }

    async fn upsert_point(&self, point: &IndexedPoint) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, self.collection_url("/points"))
            .json(&UpsertRequest { points: [point] })
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await.into());
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };
        let response = self
            .request(reqwest::Method::POST, self.collection_url("/points/search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await.into());
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: hit.id.into_string(),
                score: hit.score,
                payload: hit.payload.unwrap_or_default(),
            })
            .collect())
    }
}

// ============ In-memory ============

/// In-memory store for tests and offline runs.
///
/// Uses a `Vec` behind `std::sync::RwLock`. Search is brute-force cosine
/// similarity over all stored vectors.
#[derive(Default)]
pub struct InMemoryVectorStore {
    dims: RwLock<Option<usize>>,
    points: RwLock<Vec<IndexedPoint>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored points, in insertion order.
    pub fn points(&self) -> Vec<IndexedPoint> {
        self.points.read().map(|p| p.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("in-memory vector store lock poisoned")
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, dims: usize) -> Result<CollectionStatus> {
        let mut current = self.dims.write().map_err(poisoned)?;
        let existing_dims = *current;
        match existing_dims {
            Some(existing) if existing == dims => Ok(CollectionStatus::AlreadyExists),
            Some(existing) => anyhow::bail!(
                "collection exists with {} dimensions, requested {}",
                existing,
                dims
            ),
            None => {
                *current = Some(dims);
                Ok(CollectionStatus::Created)
            }
        }
    }

    async fn upsert_point(&self, point: &IndexedPoint) -> Result<()> {
        if let Some(dims) = *self.dims.read().map_err(poisoned)? {
            if point.vector.len() != dims {
                anyhow::bail!(
                    "point {} has {} dimensions, collection expects {}",
                    point.id,
                    point.vector.len(),
                    dims
                );
            }
        }
        let mut points = self.points.write().map_err(poisoned)?;
        points.retain(|p| p.id != point.id);
        points.push(point.clone());
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let points = self.points.read().map_err(poisoned)?;
        let mut scored: Vec<ScoredPoint> = points
            .iter()
            .map(|p| ScoredPoint {
                id: p.id.clone(),
                score: cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}
