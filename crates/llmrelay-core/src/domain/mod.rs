//! Wire-level request and response types for the passthrough APIs.
//!
//! These match the gateway's JSON contract; the relay forwards payloads
//! without reshaping them, so the types exist mainly to validate inbound
//! requests and to give the content variants a real shape.

mod chat;
mod ocr;

pub use chat::{
    ChatRequest, ChatResponse, Choice, ContentPart, InlineData, Message, MessageContent,
    PromptTokensDetails, ResponseMessage, Usage,
};
pub use ocr::{OcrDimensions, OcrDocument, OcrPage, OcrRequest, OcrResponse, OcrUsageInfo};

use thiserror::Error;

/// Inbound request validation failures, reported as 400s by the server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `model` was missing or blank.
    #[error("model is required")]
    MissingModel,

    /// `messages` was empty.
    #[error("messages cannot be empty")]
    EmptyMessages,

    /// OCR `document.type` was missing or blank.
    #[error("document type is required")]
    MissingDocumentType,

    /// OCR `document.document_url` was missing or blank.
    #[error("document URL is required")]
    MissingDocumentUrl,
}
