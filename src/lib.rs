//! # Workflow Finder
//!
//! Semantic search over a library of n8n automation workflows.
//!
//! Workflow exports (`.json`) and plain-text documents (`.txt`) are walked,
//! summarized, embedded and stored as points in a vector collection. A
//! natural-language query is embedded and matched against those points; each
//! match is enriched with generated prose (a description, requirements, setup
//! steps) from a chat-completion model.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │  Walker   │──▶│ Summary +  │──▶│  Qdrant   │
//! │ .json/.txt│   │  Embedding │   │  points   │
//! └───────────┘   └────────────┘   └─────┬─────┘
//!                                        │
//!                 ┌──────────────────────┤
//!                 ▼                      ▼
//!           ┌──────────┐          ┌────────────┐
//!           │   CLI    │          │  HTTP API  │──▶ chat completions
//!           │ (wfind)  │          │   (axum)   │
//!           └──────────┘          └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with environment overrides |
//! | [`models`] | Core data types |
//! | [`error`] | Typed upstream and request errors |
//! | [`walker`] | Workflow file discovery and title cleanup |
//! | [`summary`] | File loading and summary templates |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`vector_store`] | Qdrant client and in-memory store |
//! | [`completion`] | Chat completion prompts and fallbacks |
//! | [`ingest`] | Ingestion pipeline |
//! | [`finder`] | Shared service handle for queries |
//! | [`search`] | Semantic search with generated descriptions |
//! | [`details`] | Setup instructions and workflow details |
//! | [`server`] | HTTP API |
//! | [`probe`] | Health and search check against a running server |

pub mod completion;
pub mod config;
pub mod details;
pub mod embedding;
pub mod error;
pub mod finder;
pub mod ingest;
pub mod models;
pub mod probe;
pub mod search;
pub mod server;
pub mod summary;
pub mod vector_store;
pub mod walker;

#[cfg(test)]
mod test_helpers;
