use std::path::Path;
use thiserror::Error;

use crate::extract::{split_lines, Extractor};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ExtractedReceipt;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The OCR provider failed or returned nothing usable. Kept apart from a
    /// receipt that simply had no items.
    #[error("OCR extraction failed: {0}")]
    ExtractionFailed(#[from] OcrError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Raw OCR text output.
    pub ocr_text: String,
    /// Structured fields extracted from the OCR text.
    pub extracted: ExtractedReceipt,
}

/// Orchestrates: OCR → extract.
pub struct ReceiptPipeline<B: OcrBackend> {
    backend: B,
    extractor: Extractor,
}

impl<B: OcrBackend> ReceiptPipeline<B> {
    pub fn new(backend: B, extractor: Extractor) -> Self {
        Self { backend, extractor }
    }

    /// Process a file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<ScanResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "read receipt image");
        self.process_bytes(&bytes).await
    }

    /// Process raw image bytes (camera capture or file read).
    pub async fn process_bytes(&self, data: &[u8]) -> Result<ScanResult, PipelineError> {
        let ocr_text = self.backend.recognize(data).await.map_err(|e| {
            tracing::warn!(backend = self.backend.name(), error = %e, "OCR failed");
            PipelineError::ExtractionFailed(e)
        })?;

        let extracted = self.extractor.extract(&ocr_text);

        tracing::info!(
            backend = self.backend.name(),
            lines = split_lines(&ocr_text).len(),
            items = extracted.items.len(),
            "receipt interpreted"
        );
        if extracted.is_empty() {
            tracing::warn!("no item lines found on receipt");
        }

        Ok(ScanResult { ocr_text, extracted })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use crate::rules::ExtractionRules;
    use crate::types::{ReceiptLine, NOT_FOUND};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl OcrBackend for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
            Err(OcrError::NoParsedResults)
        }
    }

    #[tokio::test]
    async fn process_bytes_extracts_receipt() {
        let pipeline = ReceiptPipeline::new(
            MockRecognizer::new("SHOP MART\n05/06/2025\nMilk 2.50\nBread 1.20\nTOTAL 3.70"),
            Extractor::default(),
        );

        let result = pipeline.process_bytes(b"image").await.unwrap();

        assert_eq!(result.extracted.shop_name, "SHOP MART");
        assert_eq!(result.extracted.date, "05/06/2025");
        assert_eq!(
            result.extracted.items,
            vec![ReceiptLine::new("Milk", "2.50"), ReceiptLine::new("Bread", "1.20")]
        );
        assert!(result.ocr_text.starts_with("SHOP MART"));
    }

    #[tokio::test]
    async fn blank_receipt_is_not_an_error() {
        let pipeline = ReceiptPipeline::new(MockRecognizer::new("   \n"), Extractor::default());
        let result = pipeline.process_bytes(b"image").await.unwrap();
        assert!(result.extracted.is_empty());
        assert_eq!(result.extracted.shop_name, NOT_FOUND);
    }

    #[tokio::test]
    async fn ocr_failure_surfaces_as_extraction_failed() {
        let pipeline = ReceiptPipeline::new(Unreachable, Extractor::default());
        let err = pipeline.process_bytes(b"image").await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(OcrError::NoParsedResults)));
    }

    #[tokio::test]
    async fn process_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let pipeline = ReceiptPipeline::new(
            MockRecognizer::new("A B\nTax 0.50"),
            Extractor::new(ExtractionRules::ocr_api()),
        );
        let result = pipeline.process_file(&path).await.unwrap();
        assert_eq!(result.extracted.shop_name, "A B");
        assert_eq!(result.extracted.items, vec![ReceiptLine::new("Tax", "0.50")]);
    }

    #[tokio::test]
    async fn process_file_missing_is_io_error() {
        let pipeline = ReceiptPipeline::new(MockRecognizer::new(""), Extractor::default());
        let err = pipeline
            .process_file(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
