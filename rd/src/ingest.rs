//! Credential and payload file ingestion
//!
//! Uploaded text becomes an ordered list: one entry per line, trimmed, blank
//! lines dropped.

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use tracing::debug;

/// Split text into trimmed, non-empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read a file and split it with [`split_lines`]
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    debug!(?path, "read_lines: called");
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    let lines = split_lines(&content);
    debug!(?path, count = lines.len(), "read_lines: complete");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_lines_trims_and_drops_blanks() {
        let text = "  first \n\n\tsecond\r\n   \nthird";
        assert_eq!(split_lines(text), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_split_lines_empty() {
        assert!(split_lines("").is_empty());
        assert!(split_lines("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_read_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("messages.txt");
        fs::write(&path, "hello\nworld\n").unwrap();

        assert_eq!(read_lines(&path).unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn test_read_lines_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_lines(&temp.path().join("nope.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
