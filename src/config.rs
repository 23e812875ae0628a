//! Configuration loading.
//!
//! Settings come from an optional TOML file (`--config`, default
//! `./config/wfind.toml`) and are then overridden by environment variables,
//! which is how the hosted-service credentials are normally supplied.
//! The resulting [`Config`] is immutable and shared by reference.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `OPENAI_API_KEY` | `openai.api_key` |
//! | `QDRANT_URL` | `vector_store.url` |
//! | `QDRANT_API_KEY` | `vector_store.api_key` |
//! | `WORKFLOW_DIR` | `ingest.root` |
//! | `GITHUB_RAW_REFS_BASE` | `ingest.raw_base_url` |
//! | `PORT` | `server.bind` (as `0.0.0.0:{PORT}`) |
//! | `NODE_ENV` | `server.environment` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}
fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            api_key: None,
            collection: default_collection(),
            dims: default_dims(),
            search_limit: default_search_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_collection() -> String {
    "n8n_workflows".to_string()
}
fn default_dims() -> usize {
    3072
}
fn default_search_limit() -> usize {
    5
}

/// How point ids are assigned during ingestion.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Every stored file gets a fresh random id. Re-ingesting duplicates points.
    #[default]
    AlwaysInsert,
    /// The id is derived from the relative path and file content, so
    /// re-ingesting an unchanged file overwrites its point.
    ContentHash,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub raw_base_url: Option<String>,
    #[serde(default = "default_max_embed_chars")]
    pub max_embed_chars: usize,
    #[serde(default)]
    pub dedup: DedupMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            raw_base_url: None,
            max_embed_chars: default_max_embed_chars(),
            dedup: DedupMode::default(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("../n8n-master-workflows")
}
fn default_max_embed_chars() -> usize {
    2000
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Interpret `NODE_ENV`: `production` selects production, anything else
    /// development.
    pub fn from_node_env(value: &str) -> Self {
        if value == "production" {
            Self::Production
        } else {
            Self::Development
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_max_concurrent_completions")]
    pub max_concurrent_completions: usize,
    #[serde(default = "default_development_origins")]
    pub development_origins: Vec<String>,
    #[serde(default = "default_production_origins")]
    pub production_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            environment: Environment::default(),
            max_concurrent_completions: default_max_concurrent_completions(),
            development_origins: default_development_origins(),
            production_origins: default_production_origins(),
        }
    }
}

impl ServerConfig {
    /// Origins allowed by CORS for the active environment.
    pub fn allowed_origins(&self) -> &[String] {
        match self.environment {
            Environment::Development => &self.development_origins,
            Environment::Production => &self.production_origins,
        }
    }

    /// A warning to log when CORS would reject every browser origin.
    pub fn origins_warning(&self) -> Option<String> {
        if !self.allowed_origins().is_empty() {
            return None;
        }
        let key = match self.environment {
            Environment::Development => "server.development_origins",
            Environment::Production => "server.production_origins",
        };
        Some(format!(
            "{} is empty; browsers on any origin will be refused by CORS",
            key
        ))
    }
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}
fn default_max_concurrent_completions() -> usize {
    5
}
fn default_development_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://localhost:8081",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_production_origins() -> Vec<String> {
    Vec::new()
}

impl Config {
    /// API key for the embedding and completion service, or an error naming
    /// the variable that supplies it.
    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))
    }

    /// The raw-content base URL, if one is configured and non-empty.
    pub fn raw_base_url(&self) -> Option<&str> {
        self.ingest
            .raw_base_url
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.is_empty())
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(dir) = lookup("WORKFLOW_DIR") {
            self.ingest.root = PathBuf::from(dir);
        }
        if let Some(base) = lookup("GITHUB_RAW_REFS_BASE") {
            self.ingest.raw_base_url = Some(base);
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            self.server.bind = format!("0.0.0.0:{}", port);
        }
        if let Some(env) = lookup("NODE_ENV") {
            self.server.environment = Environment::from_node_env(&env);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.vector_store.dims == 0 {
            bail!("vector_store.dims must be > 0");
        }
        if self.vector_store.search_limit < 1 {
            bail!("vector_store.search_limit must be >= 1");
        }
        if self.vector_store.collection.trim().is_empty() {
            bail!("vector_store.collection must not be empty");
        }
        if self.ingest.max_embed_chars == 0 {
            bail!("ingest.max_embed_chars must be > 0");
        }
        if self.server.max_concurrent_completions < 1 {
            bail!("server.max_concurrent_completions must be >= 1");
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            bail!("openai.temperature must be in [0.0, 2.0]");
        }
        if let Some(base) = self.raw_base_url() {
            url::Url::parse(base).with_context(|| {
                format!("ingest.raw_base_url (GITHUB_RAW_REFS_BASE) is not an absolute URL: '{}'", base)
            })?;
        }
        Ok(())
    }
}

/// Parse a TOML config string without consulting the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load the config file (if present), then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}
