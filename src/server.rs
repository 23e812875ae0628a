//! HTTP API for the workflow finder.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/health` | Liveness check |
//! | `POST` | `/api/search` | Semantic search with generated descriptions |
//! | `POST` | `/api/setup-instructions` | Numbered setup guide for a workflow |
//! | `POST` | `/api/workflow-details` | Requirements and background for a workflow |
//!
//! # Error Contract
//!
//! Validation failures (including a body that is not JSON) return 400 with
//! `{"error": "<message>"}`. Failures of the embedding or vector search call
//! return 500 with `{"error": "Internal server error", "message": "<cause>"}`.
//! Completion failures never surface; the handlers fall back to templated text.
//!
//! # CORS
//!
//! Only the origins configured for the active environment are allowed, with
//! credentials.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::details::{setup_instructions, workflow_details};
use crate::error::RequestError;
use crate::finder::Finder;
use crate::models::{SetupInstructions, WorkflowCard, WorkflowDetails};
use crate::search::search_workflows;

const HEALTH_MESSAGE: &str = "n8n Workflow AI API is running";
const QUERY_REQUIRED: &str = "Query is required and must be a string";
const WORKFLOW_REQUIRED: &str = "workflowName and nodes array are required";

#[derive(Clone)]
struct AppState {
    finder: Arc<Finder>,
}

/// Start the HTTP server on `[server].bind` and run until terminated.
pub async fn run_server(config: &Config) -> Result<()> {
    let finder = Arc::new(Finder::from_config(config)?);
    if let Some(warning) = config.server.origins_warning() {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        embedding_model = %finder.embedder.model_name(),
        completion_model = %finder.completer.model_name(),
        "providers ready"
    );
    let app = build_router(finder, config.server.allowed_origins())?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    tracing::info!(
        bind = %config.server.bind,
        environment = ?config.server.environment,
        collection = %config.vector_store.collection,
        "server started"
    );
    println!("Workflow finder listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the API router around a shared [`Finder`].
///
/// # Errors
///
/// Returns an error if an allowed origin is not a valid header value.
pub fn build_router(finder: Arc<Finder>, allowed_origins: &[String]) -> Result<Router> {
    let state = AppState { finder };

    Ok(Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/search", post(handle_search))
        .route("/api/setup-instructions", post(handle_setup_instructions))
        .route("/api/workflow-details", post(handle_workflow_details))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: '{}'", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]))
}

// ============ Error response ============

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (StatusCode::BAD_REQUEST, ErrorBody { error, message: None }),
            Self::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".to_string(),
                    message: Some(message),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::InvalidInput(msg) => Self::BadRequest(msg),
            RequestError::Upstream(e) => {
                tracing::error!(error = %format!("{:#}", e), "request failed");
                Self::Internal(e.to_string())
            }
        }
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::BadRequest(message.to_string())
}

/// Unwrap a JSON body, reporting any rejection as a 400 with `message`.
fn json_body(payload: Result<Json<Value>, JsonRejection>, message: &str) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            Err(bad_request(message))
        }
    }
}

/// Extract `workflowName` and `nodes` from a setup or details request.
fn workflow_args(body: &Value) -> Result<(String, Vec<String>), ApiError> {
    let name = body
        .get("workflowName")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request(WORKFLOW_REQUIRED))?;

    let nodes = body
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request(WORKFLOW_REQUIRED))?
        .iter()
        .map(|n| n.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| bad_request("nodes must be an array of strings"))?;

    Ok((name.to_string(), nodes))
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: HEALTH_MESSAGE,
    })
}

// ============ POST /api/search ============

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    query: String,
    results: Vec<WorkflowCard>,
    count: usize,
}

async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let body = json_body(payload, QUERY_REQUIRED)?;
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request(QUERY_REQUIRED))?;

    tracing::info!(query, "search");
    let results = search_workflows(&state.finder, query).await?;

    Ok(Json(SearchResponse {
        success: true,
        query: query.to_string(),
        count: results.len(),
        results,
    }))
}

// ============ POST /api/setup-instructions ============

/// Success envelope: `{"success": true, ...body}`.
#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Json<Self> {
        Json(Self { success: true, body })
    }
}

async fn handle_setup_instructions(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<SetupInstructions>>, ApiError> {
    let body = json_body(payload, WORKFLOW_REQUIRED)?;
    let (name, nodes) = workflow_args(&body)?;

    let setup = setup_instructions(&state.finder, &name, &nodes).await?;
    Ok(Success::new(setup))
}

// ============ POST /api/workflow-details ============

async fn handle_workflow_details(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<WorkflowDetails>>, ApiError> {
    let body = json_body(payload, WORKFLOW_REQUIRED)?;
    let (name, nodes) = workflow_args(&body)?;
    let description = body.get("description").and_then(Value::as_str);

    let details = workflow_details(&state.finder, &name, &nodes, description).await?;
    Ok(Success::new(details))
}
