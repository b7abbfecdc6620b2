//! Attachment classification via the image labeling service

use anyhow::Result;
use async_trait::async_trait;

/// Number of labels recorded per attachment.
pub const LABEL_COUNT: usize = 3;

#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Descriptive labels for an image, highest confidence first.
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<String>>;
}

/// Only these exact suffixes are classified. `.PNG` and `.jpeg` are
/// deliberately not recognized.
pub fn is_image_filename(filename: &str) -> bool {
    filename.ends_with(".png") || filename.ends_with(".jpg")
}

/// Label an attachment. Always returns exactly `LABEL_COUNT` entries in
/// the service's confidence order, padded with empty strings when the
/// service returns fewer. Non-image attachments never reach the service
/// and yield all-empty labels.
pub async fn classify_attachment(
    labeler: &dyn LabelDetector,
    filename: &str,
    data: &[u8],
) -> Result<Vec<String>> {
    let mut top_labels = vec![String::new(); LABEL_COUNT];
    if is_image_filename(filename) {
        let labels = labeler.detect_labels(data).await?;
        for (slot, label) in top_labels.iter_mut().zip(labels) {
            *slot = label;
        }
    }
    Ok(top_labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLabels(Vec<&'static str>);

    #[async_trait]
    impl LabelDetector for FixedLabels {
        async fn detect_labels(&self, _image: &[u8]) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|label| label.to_string()).collect())
        }
    }

    /// Fails the test if the pipeline sends a non-image to the service.
    struct RejectAll;

    #[async_trait]
    impl LabelDetector for RejectAll {
        async fn detect_labels(&self, _image: &[u8]) -> Result<Vec<String>> {
            panic!("detect_labels called for a non-image attachment");
        }
    }

    #[test]
    fn test_image_filename_policy() {
        assert!(is_image_filename("photo.png"));
        assert!(is_image_filename("photo.jpg"));
        // Case-sensitive suffix match only
        assert!(!is_image_filename("photo.PNG"));
        assert!(!is_image_filename("photo.jpeg"));
        assert!(!is_image_filename("notes.txt"));
        assert!(!is_image_filename("png"));
    }

    #[tokio::test]
    async fn test_labels_ordered_and_truncated() {
        let labeler = FixedLabels(vec!["cat", "animal", "pet", "mammal"]);
        let labels = classify_attachment(&labeler, "photo.png", b"bytes")
            .await
            .unwrap();
        assert_eq!(labels, vec!["cat", "animal", "pet"]);
    }

    #[tokio::test]
    async fn test_labels_padded_with_empty_strings() {
        let labeler = FixedLabels(vec!["cat"]);
        let labels = classify_attachment(&labeler, "photo.jpg", b"bytes")
            .await
            .unwrap();
        assert_eq!(labels, vec!["cat", "", ""]);
    }

    #[tokio::test]
    async fn test_non_image_yields_empty_labels_without_calling_service() {
        let labels = classify_attachment(&RejectAll, "report.pdf", b"not an image")
            .await
            .unwrap();
        assert_eq!(labels, vec!["", "", ""]);
        assert_eq!(labels.len(), LABEL_COUNT);
    }

    #[tokio::test]
    async fn test_uppercase_extension_not_recognized() {
        let labels = classify_attachment(&RejectAll, "photo.PNG", b"image bytes")
            .await
            .unwrap();
        assert_eq!(labels, vec!["", "", ""]);
    }
}
