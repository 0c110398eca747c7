//! Domain types and settings for the llmrelay gateway relay.
//!
//! This crate holds the pure data layer: request/response types for the
//! chat and OCR passthrough APIs, and the settings structure every other
//! crate is configured from. No I/O, no HTTP, no TLS here.

pub mod domain;
pub mod settings;

pub use domain::{
    ChatRequest, ChatResponse, Choice, ContentPart, InlineData, Message, MessageContent,
    OcrDimensions, OcrDocument, OcrPage, OcrRequest, OcrResponse, OcrUsageInfo, PromptTokensDetails,
    ResponseMessage, Usage, ValidationError,
};
pub use settings::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LISTEN_PORT, DEFAULT_MAX_IDLE_PER_HOST,
    DEFAULT_MAX_STREAMING_SESSIONS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_TIMEOUT_SECS,
    GatewaySettings, HttpPoolSettings, RelaySettings, TlsMode, TlsSettings,
};
