//! Canonical types for chat exchanges and typography defaults

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Hidden instructions injected ahead of the caller's turns
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl MessageRole {
    /// Lowercase wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Plain text content
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Which role narrative and rule set the prompt builder emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Compose a new document body from the user's request
    Generate,
    /// Repair possibly-malformed HTML into protocol compliance
    Fix,
}

impl PromptMode {
    /// Lowercase persisted name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Generate => "generate",
            PromptMode::Fix => "fix",
        }
    }
}

/// Typography defaults supplied by the caller, immutable per exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyDefaults {
    /// Font family name, emitted single-quoted wherever it appears
    pub font_family: String,

    /// Font size in points; must be positive
    pub font_size_pt: f64,
}

impl TypographyDefaults {
    pub fn new(font_family: impl Into<String>, font_size_pt: f64) -> Self {
        Self {
            font_family: font_family.into(),
            font_size_pt,
        }
    }

    /// Point size rendered without a trailing `.0`, so `12.0` becomes `12`
    /// and `10.5` stays `10.5`. Both the prompt header and the enforced body
    /// style interpolate this form.
    pub fn font_size(&self) -> String {
        format!("{}", self.font_size_pt)
    }
}

/// User-supplied grounding document injected into the prompt context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDocument {
    /// Caller-chosen identifier
    pub id: String,

    /// Display name, rendered into the document's context label
    pub name: String,

    /// Plain text content
    pub content: String,

    /// When the document was uploaded
    pub uploaded_at: DateTime<Utc>,
}

/// Persistence shape handed back to the host shell after an exchange.
///
/// The core never writes storage; the shell stores this under a key and
/// schema of its own choosing. The hidden system turn is never part of
/// `messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub title: String,
    pub mode: PromptMode,
    pub messages: Vec<Message>,
    pub final_html: String,
    pub created_at: DateTime<Utc>,
}
