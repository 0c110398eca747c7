//! Chat completion request/response types.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Request to the chat completions passthrough endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use.
    pub model: String,
    /// Conversation history, oldest first.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Number of candidate completions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    /// Whether to stream the response. The relay forces this to match the
    /// endpoint the caller picked, so a mismatched value is never forwarded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Validate the fields the gateway requires.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingModel);
        }
        if self.messages.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }
        Ok(())
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user" or "assistant".
    pub role: String,
    /// Message content, plain text or multimodal parts.
    pub content: MessageContent,
}

/// Message content is either a plain string or a list of typed parts.
///
/// The wire format carries both shapes under the same `content` key, so
/// the distinction is resolved here rather than passing an untyped value
/// through the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Multimodal content parts.
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part type, e.g. "text" or "inline_data".
    pub r#type: String,
    /// Text payload for text parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary payload for data parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded inline data attached to a content part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    /// The encoded payload.
    pub data: String,
}

/// Response from the gateway chat endpoint (non-streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A single completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Full message for non-streaming responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
    /// Incremental delta for streaming chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<ResponseMessage>,
}

/// Assistant message (or delta) inside a choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens_details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<PromptTokensDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}

/// Prompt token breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_request() -> ChatRequest {
        ChatRequest {
            model: "claude-sonnet".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: MessageContent::Text("hello".to_string()),
            }],
            temperature: Some(0.2),
            max_tokens: None,
            candidate_count: None,
            stream: None,
        }
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        assert!(text_request().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_model() {
        let mut req = text_request();
        req.model = "  ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::MissingModel));
    }

    #[test]
    fn validate_rejects_empty_messages() {
        let mut req = text_request();
        req.messages.clear();
        assert_eq!(req.validate(), Err(ValidationError::EmptyMessages));
    }

    #[test]
    fn content_deserializes_plain_text() {
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert!(matches!(msg.content, MessageContent::Text(ref t) if t == "hi"));
    }

    #[test]
    fn content_deserializes_part_list() {
        let json = r#"{"role":"user","content":[
            {"type":"text","text":"describe this"},
            {"type":"inline_data","inline_data":{"data":"aGVsbG8="}}
        ]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        match msg.content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].r#type, "text");
                assert_eq!(parts[1].inline_data.as_ref().unwrap().data, "aGVsbG8=");
            }
            MessageContent::Text(_) => panic!("expected part list"),
        }
    }

    #[test]
    fn content_round_trips_without_tag() {
        let msg = Message {
            role: "user".to_string(),
            content: MessageContent::Text("plain".to_string()),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"plain"}"#);
    }

    #[test]
    fn optional_fields_are_omitted_when_none() {
        let req = text_request();
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("stream"));
        assert!(json.contains("temperature"));
    }
}
