use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::recognizer::{OcrBackend, OcrError};

pub const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// Settings for the OCR.space style HTTP API.
#[derive(Debug, Clone)]
pub struct OcrSpaceConfig {
    pub api_key: String,
    pub endpoint: String,
    pub language: String,
    /// Ask the service to keep table rows on one line.
    pub is_table: bool,
    pub timeout: Duration,
}

impl OcrSpaceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: "eng".to_string(),
            is_table: true,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Remote OCR provider. Uploads the raw file bytes as multipart form data and
/// reads `ParsedResults[0].ParsedText` from the JSON reply.
pub struct OcrSpaceRecognizer {
    client: Client,
    config: OcrSpaceConfig,
}

impl OcrSpaceRecognizer {
    pub fn new(config: OcrSpaceConfig) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn form(&self, image_bytes: &[u8]) -> Form {
        // The service sniffs the type from the file name.
        let ext = image::guess_format(image_bytes)
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("jpg");
        let file = Part::bytes(image_bytes.to_vec()).file_name(format!("receipt.{ext}"));

        Form::new()
            .text("apikey", self.config.api_key.clone())
            .text("language", self.config.language.clone())
            .text("isTable", self.config.is_table.to_string())
            .part("file", file)
    }
}

#[async_trait]
impl OcrBackend for OcrSpaceRecognizer {
    fn name(&self) -> &'static str {
        "ocr-space"
    }

    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        tracing::debug!(endpoint = %self.config.endpoint, bytes = image_bytes.len(), "uploading to OCR service");

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(self.form(image_bytes))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

// ── Response shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// A string or a list of strings, depending on the failure.
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    parsed_text: Option<String>,
    /// Negative when the service failed on this page.
    #[serde(default)]
    file_parse_exit_code: Option<i64>,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

fn parse_response(body: &str) -> Result<String, OcrError> {
    let response: OcrSpaceResponse =
        serde_json::from_str(body).map_err(|e| OcrError::MalformedResponse(e.to_string()))?;

    let first = response.parsed_results.unwrap_or_default().into_iter().next();

    // Errored replies may still carry a result entry with empty text.
    let page_failed = first
        .as_ref()
        .and_then(|r| r.file_parse_exit_code)
        .is_some_and(|code| code < 0);
    if response.is_errored_on_processing || page_failed {
        let message = response
            .error_message
            .as_ref()
            .or_else(|| first.as_ref().and_then(|r| r.error_message.as_ref()))
            .map(error_text)
            .unwrap_or_default();
        return Err(OcrError::Api(message));
    }

    match first {
        Some(ParsedResult { parsed_text: Some(text), .. }) => Ok(text),
        Some(ParsedResult { parsed_text: None, .. }) => Err(OcrError::MalformedResponse(
            "ParsedResults[0].ParsedText is missing".to_string(),
        )),
        None => Err(OcrError::NoParsedResults),
    }
}

fn error_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
