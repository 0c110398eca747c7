//! API-layer response envelopes.
//!
//! Domain types live in `llmrelay-core`; this module only carries the
//! error envelope the REST surface answers failures with.

use chrono::Utc;
use serde::Serialize;

/// Structured error envelope returned for validation and gateway failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// When the error was produced (RFC 3339).
    pub timestamp: String,
    /// HTTP status code mirrored into the body.
    pub status: u16,
    /// Short error category.
    pub error: String,
    /// Human-readable detail; for gateway failures this carries the
    /// captured upstream body verbatim.
    pub message: String,
    /// Request path that failed.
    pub path: String,
}

impl ErrorResponse {
    /// Create an envelope for the given category and detail.
    pub fn new(
        status: u16,
        error: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status,
            error: error.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    /// Envelope for an inbound request that failed validation.
    pub fn validation(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(400, "Validation Error", message, path)
    }

    /// Envelope for a gateway failure.
    pub fn gateway(status: u16, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(status, "Gateway Error", message, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_envelope_is_a_400() {
        let envelope = ErrorResponse::validation("model is required", "/api/v1/chat/completions");
        assert_eq!(envelope.status, 400);
        assert_eq!(envelope.error, "Validation Error");
    }

    #[test]
    fn gateway_envelope_carries_upstream_body() {
        let envelope = ErrorResponse::gateway(503, r#"{"fault":"quota"}"#, "/api/v1/mistral/ocr");
        assert_eq!(envelope.status, 503);
        assert_eq!(envelope.message, r#"{"fault":"quota"}"#);
    }
}
