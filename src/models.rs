//! Core data models used throughout the finder.
//!
//! These types represent the workflow files, stored points and response
//! shapes that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of workflow definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// An n8n workflow export (`.json`).
    Json,
    /// A plain-text document (`.txt`).
    Txt,
}

impl FileType {
    /// Recognize a file by its extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".json") {
            Some(Self::Json)
        } else if lower.ends_with(".txt") {
            Some(Self::Txt)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
        }
    }
}

/// A file found by the walker, before its content is read.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub relative_path: String,
    pub file_type: FileType,
}

/// Parsed content of a workflow file.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowContent {
    /// Node types of a workflow export, at most 50.
    Structured { node_types: Vec<String> },
    /// Raw text of a document.
    Text { raw_text: String },
}

/// A workflow file read from disk, ready to be summarized.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub relative_path: String,
    pub title: String,
    pub file_type: FileType,
    pub content: WorkflowContent,
    /// Hex SHA-256 of the relative path and raw bytes.
    pub content_hash: String,
}

impl WorkflowFile {
    pub fn node_types(&self) -> &[String] {
        match &self.content {
            WorkflowContent::Structured { node_types } => node_types,
            WorkflowContent::Text { .. } => &[],
        }
    }
}

/// Metadata stored alongside each vector.
///
/// Absent fields are omitted on the wire, so a stored payload never
/// carries a null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// The persisted unit in the vector store.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// A nearest-neighbor match returned by the vector store.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    /// Similarity; higher is closer.
    pub score: f32,
    pub payload: PointPayload,
}

/// Heuristic difficulty label derived from the match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn from_score(score: f32) -> Self {
        if score > 0.8 {
            Self::Beginner
        } else if score > 0.6 {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }
}

/// One workflow in a search response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub trigger: String,
    pub services: Vec<String>,
    pub difficulty: Difficulty,
    pub node_count: usize,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    pub nodes: Vec<String>,
}

/// Generated requirements and background for one workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetails {
    pub workflow_name: String,
    pub description: String,
    pub requirements: String,
    pub detailed_info: String,
    pub node_count: usize,
    pub nodes: Vec<String>,
}

/// A single numbered setup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupStep {
    pub id: usize,
    pub content: String,
}

/// Generated setup guide with its parsed steps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupInstructions {
    pub workflow_name: String,
    pub instructions: String,
    pub steps: Vec<SetupStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(Difficulty::from_score(0.85), Difficulty::Beginner);
        assert_eq!(Difficulty::from_score(0.65), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_score(0.3), Difficulty::Advanced);
    }

    #[test]
    fn test_difficulty_boundaries_are_strict() {
        assert_eq!(Difficulty::from_score(0.8), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_score(0.6), Difficulty::Advanced);
    }

    #[test]
    fn test_file_type_from_name() {
        assert_eq!(FileType::from_file_name("a.json"), Some(FileType::Json));
        assert_eq!(FileType::from_file_name("README.TXT"), Some(FileType::Txt));
        assert_eq!(FileType::from_file_name("notes.md"), None);
        assert_eq!(FileType::from_file_name("json"), None);
    }

    #[test]
    fn test_payload_omits_absent_fields() {
        let payload = PointPayload {
            title: Some("guide".to_string()),
            file_type: Some(FileType::Txt),
            nodes: None,
            file_url: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "title": "guide", "file_type": "txt" })
        );
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let card = WorkflowCard {
            id: "1".to_string(),
            name: "slack alert".to_string(),
            description: "d".to_string(),
            trigger: "Start".to_string(),
            services: vec!["Start".to_string()],
            difficulty: Difficulty::Beginner,
            node_count: 1,
            score: 0.9,
            file_url: None,
            file_type: Some(FileType::Json),
            nodes: vec!["Start".to_string()],
        };
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["nodeCount"], 1);
        assert_eq!(value["fileType"], "json");
        assert_eq!(value["difficulty"], "beginner");
        assert!(value.get("fileUrl").is_none());
    }
}
