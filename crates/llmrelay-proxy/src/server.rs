//! Axum HTTP server exposing the relay's REST surface.
//!
//! Three forwarding routes (chat, streaming chat, OCR) plus health probes.
//! Requests are validated against the typed domain models, then the raw
//! JSON body is forwarded untouched apart from the `stream` flag, which is
//! forced per endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use llmrelay_core::{ChatRequest, OcrRequest};

use crate::models::ErrorResponse;
use crate::relay::{RelayOutcome, StreamingRelay};
use crate::upstream::GatewayClient;

const CHAT_PATH: &str = "/api/v1/chat/completions";
const CHAT_STREAM_PATH: &str = "/api/v1/chat/completions/stream";
const OCR_PATH: &str = "/api/v1/mistral/ocr";

/// Shared application state injected via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    /// Non-streaming forwarder over the shared mTLS client.
    pub gateway: Arc<GatewayClient>,
    /// Bounded streaming relay over the same client.
    pub relay: Arc<StreamingRelay>,
}

/// Build the relay's router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/chat/health", get(health_check))
        .route("/api/v1/mistral/ocr/health", get(health_check))
        .route(CHAT_PATH, post(chat_completions))
        .route(CHAT_STREAM_PATH, post(chat_completions_stream))
        .route(OCR_PATH, post(mistral_ocr))
        .with_state(state)
}

/// Run the relay server on a pre-bound listener until the cancellation
/// token fires.
///
/// # Errors
///
/// Fails if the listener address cannot be read or the server loop aborts.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Relay server starting on {addr}");

    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Relay server shut down");
    Ok(())
}

/// Liveness probe.
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Handle a non-streaming chat completion.
async fn chat_completions(State(state): State<AppState>, body: Bytes) -> Response {
    let mut payload = match parse_chat(&body, CHAT_PATH) {
        Ok(payload) => payload,
        Err(resp) => return resp,
    };

    // This endpoint always answers with a single JSON document.
    payload["stream"] = JsonValue::Bool(false);

    match state.gateway.forward_chat(&payload).await {
        Ok(json) => Json(json).into_response(),
        Err(e) => gateway_failure(&e, CHAT_PATH),
    }
}

/// Handle a streaming chat completion as a line-by-line event stream.
async fn chat_completions_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let mut payload = match parse_chat(&body, CHAT_STREAM_PATH) {
        Ok(payload) => payload,
        Err(resp) => return resp,
    };

    payload["stream"] = JsonValue::Bool(true);

    let (stream, handle) = state.relay.open(payload).await;

    // The worker outlives the response body; collect its terminal outcome
    // for the log either way.
    tokio::spawn(async move {
        let report = handle.report().await;
        match report.outcome {
            RelayOutcome::Completed => {
                info!(lines = report.lines_forwarded, "Streaming session completed");
            }
            RelayOutcome::CompletedWithError(message) => {
                warn!(
                    upstream_status = ?report.upstream_status,
                    lines = report.lines_forwarded,
                    %message,
                    "Streaming session completed with error"
                );
            }
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream.map(Ok::<_, Infallible>)),
    )
        .into_response()
}

/// Handle a document OCR request.
async fn mistral_ocr(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match parse_ocr(&body, OCR_PATH) {
        Ok(payload) => payload,
        Err(resp) => return resp,
    };

    match state.gateway.forward_ocr(&payload).await {
        Ok(json) => Json(json).into_response(),
        Err(e) => gateway_failure(&e, OCR_PATH),
    }
}

/// Parse and validate a chat request, returning the raw JSON to forward.
fn parse_chat(body: &Bytes, path: &str) -> Result<JsonValue, Response> {
    let value: JsonValue =
        serde_json::from_slice(body).map_err(|e| validation_failure(&e.to_string(), path))?;
    let request: ChatRequest = serde_json::from_value(value.clone())
        .map_err(|e| validation_failure(&e.to_string(), path))?;
    request
        .validate()
        .map_err(|e| validation_failure(&e.to_string(), path))?;
    Ok(value)
}

/// Parse and validate an OCR request, returning the raw JSON to forward.
fn parse_ocr(body: &Bytes, path: &str) -> Result<JsonValue, Response> {
    let value: JsonValue =
        serde_json::from_slice(body).map_err(|e| validation_failure(&e.to_string(), path))?;
    let request: OcrRequest = serde_json::from_value(value.clone())
        .map_err(|e| validation_failure(&e.to_string(), path))?;
    request
        .validate()
        .map_err(|e| validation_failure(&e.to_string(), path))?;
    Ok(value)
}

fn validation_failure(message: &str, path: &str) -> Response {
    warn!(%path, %message, "Rejecting invalid request");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::validation(message, path)),
    )
        .into_response()
}

fn gateway_failure(err: &crate::error::UpstreamError, path: &str) -> Response {
    error!(%path, "Gateway forwarding failed: {err}");
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse::gateway(err.status_code(), err.to_string(), path)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn chat_parse_rejects_missing_model() {
        let body = Bytes::from_static(br#"{"messages":[{"role":"user","content":"hi"}]}"#);
        assert!(parse_chat(&body, CHAT_PATH).is_err());
    }

    #[test]
    fn chat_parse_returns_raw_payload() {
        let body = Bytes::from_static(
            br#"{"model":"m","messages":[{"role":"user","content":"hi"}],"vendor_extra":1}"#,
        );
        let payload = parse_chat(&body, CHAT_PATH).unwrap();
        // Unknown fields survive because the raw value is forwarded.
        assert_eq!(payload["vendor_extra"], 1);
    }

    #[test]
    fn ocr_parse_rejects_missing_document() {
        let body = Bytes::from_static(br#"{"model":"mistral-ocr"}"#);
        assert!(parse_ocr(&body, OCR_PATH).is_err());
    }
}
