//! Workflow summaries used as embedding input.
//!
//! A workflow export is summarized by the node types it uses; a text
//! document by its leading content. Both render a fixed template around
//! the file's title.

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::models::{DiscoveredFile, FileType, WorkflowContent, WorkflowFile};
use crate::walker::clean_file_name;

/// Maximum number of node types kept per workflow.
pub const MAX_NODE_TYPES: usize = 50;

/// Number of characters of a text document included in its summary.
pub const TEXT_EXCERPT_CHARS: usize = 800;

/// Read and parse a discovered file.
///
/// Fails if the file cannot be read or a `.json` file is not valid JSON.
pub fn load_workflow(file: &DiscoveredFile) -> Result<WorkflowFile> {
    let bytes = std::fs::read(&file.path)
        .with_context(|| format!("Failed to read {}", file.path.display()))?;

    let file_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let content = match file.file_type {
        FileType::Json => {
            let json: Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid JSON in {}", file.relative_path))?;
            WorkflowContent::Structured {
                node_types: extract_node_types(&json),
            }
        }
        FileType::Txt => WorkflowContent::Text {
            raw_text: String::from_utf8_lossy(&bytes).into_owned(),
        },
    };

    let mut hasher = Sha256::new();
    hasher.update(file.relative_path.as_bytes());
    hasher.update(&bytes);
    let content_hash = format!("{:x}", hasher.finalize());

    Ok(WorkflowFile {
        relative_path: file.relative_path.clone(),
        title: clean_file_name(&file_name),
        file_type: file.file_type,
        content,
        content_hash,
    })
}

/// Collect the `type` of each entry in the top-level `nodes` array.
///
/// Entries without a non-empty string `type` are skipped. A missing or
/// malformed `nodes` field yields an empty list.
pub fn extract_node_types(json: &Value) -> Vec<String> {
    let Some(nodes) = json.get("nodes").and_then(Value::as_array) else {
        return Vec::new();
    };

    nodes
        .iter()
        .filter_map(|node| node.get("type").and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .take(MAX_NODE_TYPES)
        .map(str::to_string)
        .collect()
}

pub fn build_json_summary(title: &str, node_types: &[String]) -> String {
    format!(
        "Workflow title: {title}\n\n\
         This n8n workflow uses the following nodes:\n\
         {nodes}\n\n\
         This workflow is suitable for automation tasks related to:\n\
         {title}.",
        title = title,
        nodes = node_types.join(", "),
    )
    .trim()
    .to_string()
}

pub fn build_txt_summary(title: &str, content: &str) -> String {
    format!(
        "Document title: {}\n\nThis document explains:\n{}",
        title,
        truncate_chars(content, TEXT_EXCERPT_CHARS)
    )
    .trim()
    .to_string()
}

/// Render the embedding input for a loaded file.
pub fn summarize(file: &WorkflowFile) -> String {
    match &file.content {
        WorkflowContent::Structured { node_types } => build_json_summary(&file.title, node_types),
        WorkflowContent::Text { raw_text } => build_txt_summary(&file.title, raw_text),
    }
}

/// The first `max` characters of `s` (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_node_types() {
        let json = json!({
            "nodes": [
                { "type": "n8n-nodes-base.start" },
                { "name": "no type" },
                { "type": "" },
                { "type": 7 },
                { "type": "n8n-nodes-base.slack" }
            ]
        });
        assert_eq!(
            extract_node_types(&json),
            vec!["n8n-nodes-base.start", "n8n-nodes-base.slack"]
        );
    }

    #[test]
    fn test_extract_node_types_missing_or_malformed() {
        assert!(extract_node_types(&json!({})).is_empty());
        assert!(extract_node_types(&json!({ "nodes": "oops" })).is_empty());
        assert!(extract_node_types(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_extract_node_types_capped() {
        let nodes: Vec<Value> = (0..80).map(|i| json!({ "type": format!("t{}", i) })).collect();
        let types = extract_node_types(&json!({ "nodes": nodes }));
        assert_eq!(types.len(), MAX_NODE_TYPES);
        assert_eq!(types[49], "t49");
    }

    #[test]
    fn test_json_summary_template() {
        let summary = build_json_summary("slack alert", &["Start".to_string(), "Slack".to_string()]);
        assert_eq!(
            summary,
            "Workflow title: slack alert\n\n\
             This n8n workflow uses the following nodes:\n\
             Start, Slack\n\n\
             This workflow is suitable for automation tasks related to:\n\
             slack alert."
        );
    }

    #[test]
    fn test_txt_summary_truncates() {
        let content = "z".repeat(2000);
        let summary = build_txt_summary("guide", &content);
        assert!(summary.starts_with("Document title: guide\n\nThis document explains:\n"));
        assert_eq!(summary.matches('z').count(), TEXT_EXCERPT_CHARS);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_load_workflow_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slack-alert.json");
        fs::write(&path, r#"{"nodes":[{"type":"Start"},{"type":"Slack"}]}"#).unwrap();

        let file = load_workflow(&DiscoveredFile {
            path,
            relative_path: "slack-alert.json".to_string(),
            file_type: FileType::Json,
        })
        .unwrap();

        assert_eq!(file.title, "slack alert");
        assert_eq!(file.node_types(), ["Start", "Slack"]);
        assert_eq!(file.content_hash.len(), 64);
    }

    #[test]
    fn test_load_workflow_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let result = load_workflow(&DiscoveredFile {
            path,
            relative_path: "broken.json".to_string(),
            file_type: FileType::Json,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_content_hash_depends_on_path_and_content() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "same").unwrap();
        fs::write(tmp.path().join("b.txt"), "same").unwrap();

        let load = |name: &str| {
            load_workflow(&DiscoveredFile {
                path: tmp.path().join(name),
                relative_path: name.to_string(),
                file_type: FileType::Txt,
            })
            .unwrap()
        };
        assert_ne!(load("a.txt").content_hash, load("b.txt").content_hash);
        assert_eq!(load("a.txt").content_hash, load("a.txt").content_hash);
    }
}
