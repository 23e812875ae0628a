//! Workflow file discovery.
//!
//! Walks a directory tree depth-first and yields every regular file whose
//! name ends in `.json` or `.txt`. The walk is lazy: files are produced as
//! directories are read, and the first traversal error ends the sequence.

use anyhow::{bail, Result};
use std::path::Path;
use walkdir::WalkDir;

use crate::models::{DiscoveredFile, FileType};

/// Iterate over the workflow files below `root`.
///
/// Entries of each directory are visited in file-name order. Symlinks are
/// not followed. An unreadable entry is yielded as an error.
pub fn walk_workflows(root: &Path) -> Result<impl Iterator<Item = Result<DiscoveredFile>>> {
    if !root.is_dir() {
        bail!("Workflow directory does not exist: {}", root.display());
    }

    let root = root.to_path_buf();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    Ok(walker.filter_map(move |entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e.into())),
        };
        if !entry.file_type().is_file() {
            return None;
        }

        let name = entry.file_name().to_string_lossy();
        let file_type = FileType::from_file_name(&name)?;

        let path = entry.path();
        let relative = path.strip_prefix(&root).unwrap_or(path);
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(Ok(DiscoveredFile {
            path: path.to_path_buf(),
            relative_path,
            file_type,
        }))
    }))
}

/// Derive a human-readable title from a file name.
///
/// Drops a `.json`/`.txt` extension, turns runs of `_` and `-` into single
/// spaces and collapses whitespace: `slack-alert.json` → `slack alert`.
pub fn clean_file_name(file_name: &str) -> String {
    let stem = strip_suffix_ignore_case(file_name, ".json")
        .or_else(|| strip_suffix_ignore_case(file_name, ".txt"))
        .unwrap_or(file_name);

    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
        Some(&s[..split])
    } else {
        None
    }
}

/// Build the downloadable URL of a file from the raw-content base.
///
/// Characters that are not valid in a URL path (spaces, non-ASCII) are
/// percent-encoded; separators are kept.
pub fn file_url(raw_base_url: &str, relative_path: &str) -> Result<String> {
    let joined = format!("{}/{}", raw_base_url.trim_end_matches('/'), relative_path);
    let url = url::Url::parse(&joined)
        .map_err(|e| anyhow::anyhow!("Invalid file URL '{}': {}", joined, e))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_file_name() {
        assert_eq!(clean_file_name("slack-alert.json"), "slack alert");
        assert_eq!(clean_file_name("Send__Email--Daily.JSON"), "Send Email Daily");
        assert_eq!(clean_file_name("  notes   about_it .txt"), "notes about it");
        assert_eq!(clean_file_name("plain"), "plain");
    }

    #[test]
    fn test_file_url_encodes_spaces() {
        let url = file_url(
            "https://raw.githubusercontent.com/o/r/refs/heads/master/",
            "Email/daily report.json",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://raw.githubusercontent.com/o/r/refs/heads/master/Email/daily%20report.json"
        );
    }

    #[test]
    fn test_file_url_rejects_relative_base() {
        assert!(file_url("not a url", "a.json").is_err());
    }

    #[test]
    fn test_walk_filters_and_recurses() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("b.json"), "{}").unwrap();
        fs::write(root.join("a.TXT"), "text").unwrap();
        fs::write(root.join("readme.md"), "# no").unwrap();
        fs::write(root.join("nested/deeper/c.json"), "{}").unwrap();

        let files: Vec<DiscoveredFile> = walk_workflows(root)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["a.TXT", "b.json", "nested/deeper/c.json"]);
        assert_eq!(files[0].file_type, FileType::Txt);
        assert_eq!(files[2].file_type, FileType::Json);
    }

    #[test]
    fn test_walk_missing_root() {
        let tmp = TempDir::new().unwrap();
        assert!(walk_workflows(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_walk_restartable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("x.json"), "{}").unwrap();

        let first = walk_workflows(tmp.path()).unwrap().count();
        let second = walk_workflows(tmp.path()).unwrap().count();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
    }
}
