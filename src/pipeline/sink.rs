//! Recording results to the spreadsheet and object store

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append one row after any existing data. No dedup at this level;
    /// a recalled message can double-write.
    async fn append_row(&self, row: &[String]) -> Result<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Single-shot upload of the raw bytes; returns the public URL of
    /// the stored object. A failure mid-write is not retried.
    async fn upload(&self, object: &str, data: Vec<u8>) -> Result<String>;
}

/// Row layout: sender, filename, then the labels or a download link.
pub fn build_row(from: &str, filename: &str, tail: &[String]) -> Vec<String> {
    let mut row = vec![from.to_string(), filename.to_string()];
    row.extend(tail.iter().cloned());
    row
}

/// Object keys are namespaced by message id so identical filenames from
/// different messages never collide.
pub fn object_name(message_id: &str, filename: &str) -> String {
    format!("{}_{}", message_id, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_row_with_labels() {
        let labels = vec![
            "cat".to_string(),
            "animal".to_string(),
            "pet".to_string(),
        ];
        let row = build_row("a@x.com", "f.png", &labels);
        assert_eq!(row, vec!["a@x.com", "f.png", "cat", "animal", "pet"]);
    }

    #[test]
    fn test_build_row_with_link() {
        let link = vec!["https://storage.googleapis.com/b/m1_f.png".to_string()];
        let row = build_row("a@x.com", "f.png", &link);
        assert_eq!(
            row,
            vec!["a@x.com", "f.png", "https://storage.googleapis.com/b/m1_f.png"]
        );
    }

    #[test]
    fn test_object_name() {
        assert_eq!(object_name("m1", "photo.jpg"), "m1_photo.jpg");
        // Same filename from different messages stays distinct
        assert_ne!(
            object_name("m1", "photo.jpg"),
            object_name("m2", "photo.jpg")
        );
    }
}
