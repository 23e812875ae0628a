//! Reachability check against a running server (`wfind probe`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{status_error, UpstreamError};

const SERVICE: &str = "workflow finder";

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    count: usize,
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    name: String,
    score: f32,
}

/// What the probe observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub health_status: String,
    pub health_message: String,
    pub count: usize,
    /// Name and score of the best match, if any.
    pub top: Option<(String, f32)>,
}

/// Call `/api/health` then `/api/search` on the server at `base_url`.
pub async fn probe(base_url: &str, query: &str) -> Result<ProbeReport> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    let base = base_url.trim_end_matches('/');

    let response = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .map_err(|e| UpstreamError::transport(SERVICE, e))?;
    if !response.status().is_success() {
        return Err(status_error(SERVICE, response).await.into());
    }
    let health: HealthBody = response
        .json()
        .await
        .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

    let response = client
        .post(format!("{}/api/search", base))
        .json(&serde_json::json!({ "query": query }))
        .send()
        .await
        .map_err(|e| UpstreamError::transport(SERVICE, e))?;
    if !response.status().is_success() {
        return Err(status_error(SERVICE, response).await.into());
    }
    let search: SearchBody = response
        .json()
        .await
        .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

    Ok(ProbeReport {
        health_status: health.status,
        health_message: health.message,
        count: search.count,
        top: search.results.into_iter().next().map(|h| (h.name, h.score)),
    })
}

/// Score as a whole percentage, rounded half up.
pub fn match_percent(score: f32) -> i64 {
    (score * 100.0).round() as i64
}

/// Run `wfind probe`.
pub async fn run_probe(base_url: &str, query: &str) -> Result<()> {
    println!("probe {}", base_url);
    match probe(base_url, query).await {
        Ok(report) => {
            println!("  health: {} ({})", report.health_status, report.health_message);
            println!("  query: {}", query);
            println!("  found: {} workflows", report.count);
            if let Some((name, score)) = &report.top {
                println!("  top result: \"{}\" ({}% match)", name, match_percent(*score));
            }
            println!("ok");
            Ok(())
        }
        Err(e) => {
            if is_connection_refused(&e) {
                println!("  connection refused: is `wfind serve` running at {}?", base_url);
            }
            Err(e).context("Probe failed")
        }
    }
}

fn is_connection_refused(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<UpstreamError>() {
        Some(UpstreamError::Transport { source, .. }) => source.is_connect(),
        _ => false,
    }
}
