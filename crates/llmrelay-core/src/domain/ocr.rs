//! OCR request/response types.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Request to the OCR passthrough endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRequest {
    /// OCR model name.
    pub model: String,
    /// The document to process.
    pub document: OcrDocument,
    /// Optional page selection, e.g. "0-3".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
}

impl OcrRequest {
    /// Validate the fields the gateway requires.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingModel);
        }
        if self.document.r#type.trim().is_empty() {
            return Err(ValidationError::MissingDocumentType);
        }
        if self.document.document_url.trim().is_empty() {
            return Err(ValidationError::MissingDocumentUrl);
        }
        Ok(())
    }
}

/// Document reference inside an OCR request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrDocument {
    /// Document type, e.g. "document_url".
    pub r#type: String,
    /// URL of the document to fetch and process.
    pub document_url: String,
}

/// Response from the gateway OCR endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<OcrPage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_annotation: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_info: Option<OcrUsageInfo>,
}

/// One processed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<OcrDimensions>,
}

/// Page dimensions reported by the OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrDimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Usage accounting for an OCR run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrUsageInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_processed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_size_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OcrRequest {
        OcrRequest {
            model: "mistral-ocr".to_string(),
            document: OcrDocument {
                r#type: "document_url".to_string(),
                document_url: "https://example.com/doc.pdf".to_string(),
            },
            pages: None,
        }
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_document_type() {
        let mut req = request();
        req.document.r#type = String::new();
        assert_eq!(req.validate(), Err(ValidationError::MissingDocumentType));
    }

    #[test]
    fn validate_rejects_blank_document_url() {
        let mut req = request();
        req.document.document_url = " ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::MissingDocumentUrl));
    }

    #[test]
    fn response_tolerates_sparse_payloads() {
        let resp: OcrResponse = serde_json::from_str(r#"{"model":"mistral-ocr"}"#).unwrap();
        assert_eq!(resp.model.as_deref(), Some("mistral-ocr"));
        assert!(resp.pages.is_none());
    }
}
