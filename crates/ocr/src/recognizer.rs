use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available: build with the `tesseract` feature")]
    NotAvailable,
    #[error("OCR service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OCR service returned HTTP {0}")]
    Status(u16),
    #[error("OCR service returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("OCR service returned no parsed results")]
    NoParsedResults,
    #[error("OCR service reported an error: {0}")]
    Api(String),
}

/// Abstraction over an OCR backend.
/// Implementations accept raw image bytes and return the recognized text.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

#[async_trait]
impl OcrBackend for Box<dyn OcrBackend> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, so the pipeline can run without an engine.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl OcrBackend for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use async_trait::async_trait;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    #[async_trait]
    impl OcrBackend for TesseractRecognizer {
        fn name(&self) -> &'static str {
            "tesseract"
        }

        async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let data_path = self.data_path.clone();
            let lang = self.lang.clone();
            let bytes = image_bytes.to_vec();
            // LepTess is blocking and not Send; build it on the worker thread.
            tokio::task::spawn_blocking(move || {
                let mut lt = LepTess::new(data_path.as_deref(), &lang)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                lt.set_image_from_mem(&bytes)
                    .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?
        }
    }
}
