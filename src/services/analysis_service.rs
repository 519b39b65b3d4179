//! Domain service for AI document analysis.
//!
//! Classifies a document as an invoice or free-form information and extracts
//! structured fields. Implementations fall back to a neutral "Analysis
//! Failed" result when the upstream model call or its response parsing
//! fails; other errors propagate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub const DOCUMENT_TYPE_INVOICE: &str = "Invoice";
pub const DOCUMENT_TYPE_INFORMATION: &str = "Information";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub document_type: String,
    #[serde(default)]
    pub invoice_data: Option<InvoiceData>,
    #[serde(default)]
    pub information_data: Option<InformationData>,
}

impl AnalysisResult {
    /// Neutral result returned when the upstream call or parsing fails.
    #[must_use]
    pub fn failed(error: &str) -> Self {
        Self {
            document_type: DOCUMENT_TYPE_INFORMATION.to_string(),
            invoice_data: None,
            information_data: Some(InformationData {
                description: "Analysis Failed".to_string(),
                summary: format!("Error: {error}"),
                sentiment: "Neutral".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub client_name: String,
    pub client_address: String,
    pub provider_name: String,
    pub provider_address: String,
    pub invoice_number: String,
    pub date: String,
    pub total: f64,
    #[serde(default)]
    pub products: Vec<ProductLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationData {
    pub description: String,
    pub summary: String,
    pub sentiment: String,
}

#[async_trait::async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(
        &self,
        file_content: &[u8],
        file_name: &str,
    ) -> Result<AnalysisResult, AnalysisError>;
}
