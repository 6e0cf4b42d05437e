use std::path::Path;

use crate::reader::{DocumentReader, Extracted};
use crate::Result;

/// Plain UTF-8 text and markdown files, one item per file.
pub struct TextReader;

impl DocumentReader for TextReader {
    fn extensions(&self) -> &[&str] {
        &["txt", "md"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<Extracted>> {
        let text = std::fs::read_to_string(path)?;
        Ok(vec![Extracted::new(text)])
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Shooting\n\nKeep the elbow under the ball.").unwrap();

        let items = TextReader.extract(&path).unwrap();

        assert_eq!(items.len(), 1);
        assert!(items[0].text.contains("elbow under the ball"));
        assert_eq!(items[0].page, None);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = TextReader.extract(Path::new("/definitely/not/here.txt"));
        assert!(result.is_err());
    }
}
