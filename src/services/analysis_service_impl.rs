//! Gemini-backed implementation of the `AnalysisService` trait.
//!
//! Without an API key the service runs in mock mode so the rest of the
//! pipeline stays exercisable in development.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AiConfig;
use crate::services::analysis_service::{
    AnalysisError, AnalysisResult, AnalysisService, DOCUMENT_TYPE_INFORMATION,
    DOCUMENT_TYPE_INVOICE, InformationData, InvoiceData, ProductLine,
};
use crate::services::event_log::EventLogService;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upstream input cap. Longer text documents are truncated before sending.
const MAX_TEXT_CHARS: usize = 30_000;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const TEXT_EXTENSIONS: [&str; 4] = ["txt", "csv", "json", "md"];

const SYSTEM_PROMPT: &str = r#"
You are an expert document analyzer. Analyze the provided document (text or image) and determine if it is an 'Invoice' or 'Information'.
Return ONLY a valid JSON object matching this structure:
{
    "documentType": "Invoice" | "Information",
    "invoiceData": {
        "clientName": "string",
        "clientAddress": "string",
        "providerName": "string",
        "providerAddress": "string",
        "invoiceNumber": "string",
        "date": "YYYY-MM-DD",
        "total": 0.00,
        "products": [
            { "name": "string", "quantity": 0, "unitPrice": 0.00, "total": 0.00 }
        ]
    },
    "informationData": {
        "description": "string",
        "summary": "string",
        "sentiment": "Positive" | "Negative" | "Neutral"
    }
}
If it is an Invoice, populate 'invoiceData' and leave 'informationData' null.
If it is Information, populate 'informationData' and leave 'invoiceData' null.
Ensure dates are valid ISO 8601 strings. Do not use markdown code blocks in response, just raw JSON.
"#;

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiAnalysisService {
    client: reqwest::Client,
    config: AiConfig,
    events: Arc<EventLogService>,
}

impl GeminiAnalysisService {
    pub fn new(config: AiConfig, events: Arc<EventLogService>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            config,
            events,
        })
    }

    /// Any `Err` here is an upstream or parse failure and maps to the
    /// neutral fallback result. Internal errors never reach this path.
    async fn call_gemini(
        &self,
        file_content: &[u8],
        file_name: &str,
    ) -> Result<AnalysisResult, String> {
        let extension = file_extension(file_name);
        let mut parts = vec![RequestPart::Text {
            text: SYSTEM_PROMPT.to_string(),
        }];

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            let mime_type = if extension == "png" {
                "image/png"
            } else {
                "image/jpeg"
            };
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: BASE64.encode(file_content),
                },
            });
            parts.push(RequestPart::Text {
                text: "Analyze this image document.".to_string(),
            });
        } else {
            let extracted = extract_text(file_content, file_name);
            if extracted.trim().is_empty() {
                return Err("Could not extract text.".to_string());
            }
            parts.push(RequestPart::Text {
                text: format!(
                    "Analyze this document content:\n\n{}",
                    truncate_chars(&extracted, MAX_TEXT_CHARS)
                ),
            });
        }

        let url = format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.config.model, self.config.gemini_api_key
        );
        let body = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("Upstream error: {e}"))?
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| format!("Malformed response: {e}"))?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| "Empty response from model".to_string())?;

        serde_json::from_str(strip_code_fences(&text).trim())
            .map_err(|e| format!("Invalid analysis JSON: {e}"))
    }

    async fn mock_analyze(file_name: &str) -> AnalysisResult {
        // Simulated model latency
        tokio::time::sleep(Duration::from_millis(1500)).await;

        if file_name.to_lowercase().contains("invoice") {
            AnalysisResult {
                document_type: DOCUMENT_TYPE_INVOICE.to_string(),
                invoice_data: Some(InvoiceData {
                    client_name: "Tech Solutions Inc.".to_string(),
                    client_address: "123 Innovation Dr".to_string(),
                    provider_name: "Cloud Services LLC".to_string(),
                    provider_address: "456 Server Ave".to_string(),
                    invoice_number: "INV-MOCK-001".to_string(),
                    date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
                    total: 1500.00,
                    products: vec![ProductLine {
                        name: "Mock Service".to_string(),
                        quantity: 1.0,
                        unit_price: 1500.0,
                        total: 1500.0,
                    }],
                }),
                information_data: None,
            }
        } else {
            AnalysisResult {
                document_type: DOCUMENT_TYPE_INFORMATION.to_string(),
                invoice_data: None,
                information_data: Some(InformationData {
                    description: "Mock Info".to_string(),
                    summary: "This is a mock response.".to_string(),
                    sentiment: "Neutral".to_string(),
                }),
            }
        }
    }

    async fn log_best_effort(&self, event_type: &str, description: &str) {
        if let Err(e) = self.events.log_event(event_type, description, None).await {
            warn!(error = %e, event_type, "Failed to record analysis event");
        }
    }
}

#[async_trait]
impl AnalysisService for GeminiAnalysisService {
    async fn analyze(
        &self,
        file_content: &[u8],
        file_name: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        if self.config.gemini_api_key.is_empty() {
            self.log_best_effort("AI Analysis Warning", "Gemini API Key not found. Using mock.")
                .await;
            return Ok(Self::mock_analyze(file_name).await);
        }

        match self.call_gemini(file_content, file_name).await {
            Ok(result) => {
                let log_summary = describe_result(&result);
                self.log_best_effort(
                    "AI Analysis",
                    &format!("Analyzed {file_name}: {log_summary}"),
                )
                .await;
                Ok(result)
            }
            Err(e) => {
                self.log_best_effort(
                    "AI Analysis Error",
                    &format!("Failed to analyze {file_name}: {e}"),
                )
                .await;
                Ok(AnalysisResult::failed(&e))
            }
        }
    }
}

fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Text formats decode as UTF-8 and PDFs go through page text extraction;
/// everything else degrades to a name placeholder the model can still
/// classify from.
fn extract_text(file_content: &[u8], file_name: &str) -> String {
    let extension = file_extension(file_name);

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        String::from_utf8_lossy(file_content).into_owned()
    } else if extension == "pdf" {
        match pdf_extract::extract_text_from_mem(file_content) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, file_name, "PDF text extraction failed");
                format!("[File: {file_name}]")
            }
        }
    } else {
        format!("[File: {file_name}]")
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Models sometimes wrap the JSON in markdown fences despite the prompt.
fn strip_code_fences(text: &str) -> &str {
    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };

    inner.split("```").next().unwrap_or(inner)
}

fn describe_result(result: &AnalysisResult) -> String {
    if result.document_type == DOCUMENT_TYPE_INVOICE
        && let Some(invoice) = &result.invoice_data
    {
        return format!(
            "Invoice {} for {}",
            invoice.invoice_number, invoice.total
        );
    }

    if let Some(info) = &result.information_data {
        return format!("Info: {}...", truncate_chars(&info.summary, 50));
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences() {
        let wrapped = "```json\n{\"documentType\": \"Information\"}\n```";
        assert_eq!(
            strip_code_fences(wrapped).trim(),
            "{\"documentType\": \"Information\"}"
        );
    }

    #[test]
    fn test_strip_bare_fences() {
        let wrapped = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(wrapped).trim(), "{\"a\": 1}");
    }

    #[test]
    fn test_unfenced_text_passes_through() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_extract_text_placeholder_for_binary_types() {
        assert_eq!(extract_text(b"\x00\x01", "scan.bin"), "[File: scan.bin]");
        assert_eq!(extract_text(b"hello", "notes.txt"), "hello");
    }

    #[test]
    fn test_extract_text_reads_pdf_pages() {
        let bytes = include_bytes!("../../tests/fixtures/invoice_sample.pdf");
        let text = extract_text(bytes, "invoice_sample.pdf");
        assert!(text.contains("INV-2024-001"), "got: {text}");
    }

    #[test]
    fn test_unreadable_pdf_degrades_to_placeholder() {
        assert_eq!(
            extract_text(b"not a pdf", "broken.pdf"),
            "[File: broken.pdf]"
        );
    }

    #[test]
    fn test_file_extension_lowercased() {
        assert_eq!(file_extension("Photo.JPG"), "jpg");
        assert_eq!(file_extension("noext"), "");
    }

    #[tokio::test]
    async fn test_mock_classifies_by_file_name() {
        let invoice = GeminiAnalysisService::mock_analyze("My_Invoice.pdf").await;
        assert_eq!(invoice.document_type, "Invoice");
        let data = invoice.invoice_data.unwrap();
        assert_eq!(data.invoice_number, "INV-MOCK-001");
        assert!(invoice.information_data.is_none());

        let info = GeminiAnalysisService::mock_analyze("notes.txt").await;
        assert_eq!(info.document_type, "Information");
        assert_eq!(info.information_data.unwrap().summary, "This is a mock response.");
    }

    #[test]
    fn test_failed_result_shape() {
        let result = AnalysisResult::failed("boom");
        assert_eq!(result.document_type, "Information");
        let info = result.information_data.unwrap();
        assert_eq!(info.description, "Analysis Failed");
        assert_eq!(info.summary, "Error: boom");
        assert_eq!(info.sentiment, "Neutral");
    }

    #[test]
    fn test_analysis_result_json_is_camel_case() {
        let result = AnalysisResult::failed("x");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["documentType"], "Information");
        assert_eq!(json["informationData"]["sentiment"], "Neutral");
        assert!(json["invoiceData"].is_null());
    }
}
