//! Wire types for the OpenAI-compatible chat completions endpoint
//!
//! Serialization shapes only; the canonical types live in `crate::protocol`.

use crate::protocol::Message;
use serde::{Deserialize, Serialize};

/// Streaming chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<WireMessage>,
}

impl ChatCompletionRequest {
    pub fn streaming(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            stream: true,
            messages: messages.iter().map(WireMessage::from).collect(),
        }
    }
}

/// Message as the endpoint expects it
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// One decoded streaming event payload.
///
/// Every field defaults so compatible endpoints that omit pieces (or append
/// extras) still decode; only the nested content delta matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// Choice entry of a streaming chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental message delta
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body shape the endpoint dialect uses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

/// Error detail with the dialect's `type` discriminator
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,

    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}
