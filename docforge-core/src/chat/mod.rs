//! Chat exchange orchestration
//!
//! One exchange: build the hidden system message, prepend it to the
//! caller's transcript, stream the completion, forward every delta to the
//! caller's sink, and guard the accumulated text once the stream settles.
//! Each call owns its own decoder buffer and observes its own cancellation
//! token, so concurrent exchanges never share state.

use crate::config::ModelConnection;
use crate::guard::{guard_html, GuardReport};
use crate::prompt::{build_reference_context, PromptBuilder, PromptError};
use crate::protocol::{HistoryItem, Message, PromptMode, ReferenceDocument, TypographyDefaults};
use crate::providers::{ChatClient, ProviderError};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors an exchange can fail with before any delta is produced
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Everything the caller supplies for one exchange
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub mode: PromptMode,
    pub typography: TypographyDefaults,

    /// Prior user/assistant turns plus the new user message. The hidden
    /// system turn is never part of this list.
    pub messages: Vec<Message>,

    pub custom_instruction: Option<String>,
    pub reference_documents: Vec<ReferenceDocument>,
}

/// How the delta stream ended
#[derive(Debug)]
pub enum Termination {
    /// The endpoint signalled completion
    Completed,

    /// The caller cancelled; partial text is retained for them to keep or
    /// discard
    Cancelled,

    /// The connection dropped mid-stream; partial text is retained
    Interrupted(ProviderError),
}

/// Settled result of one exchange
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// Exactly what the model produced, unguarded
    pub raw_text: String,

    /// Guarded body markup
    pub html: String,

    pub report: GuardReport,

    /// Caller-visible transcript including the new assistant turn
    pub messages: Vec<Message>,

    pub mode: PromptMode,

    pub termination: Termination,
}

impl ExchangeOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self.termination, Termination::Completed)
    }

    /// Shape the outcome for the host shell's history store.
    pub fn into_history(self, title: impl Into<String>) -> HistoryItem {
        HistoryItem {
            title: title.into(),
            mode: self.mode,
            messages: self.messages,
            final_html: self.html,
            created_at: Utc::now(),
        }
    }
}

/// Receives each content delta as it arrives
#[async_trait]
pub trait DeltaSink: Send {
    async fn on_delta(&mut self, delta: &str);
}

/// Sink that discards every delta; useful when only the settled outcome
/// matters
#[derive(Debug, Default)]
pub struct NullDeltaSink;

#[async_trait]
impl DeltaSink for NullDeltaSink {
    async fn on_delta(&mut self, _delta: &str) {}
}

/// Sink forwarding deltas over a channel to whatever renders them
pub struct ChannelDeltaSink {
    sender: mpsc::Sender<String>,
}

impl ChannelDeltaSink {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl DeltaSink for ChannelDeltaSink {
    async fn on_delta(&mut self, delta: &str) {
        let _ = self.sender.send(delta.to_string()).await;
    }
}

/// Drives one chat exchange end to end.
///
/// Stateless between calls and cheap to clone; the underlying HTTP client
/// shares its connection pool across clones.
#[derive(Clone)]
pub struct ChatOrchestrator {
    client: ChatClient,
    prompts: PromptBuilder,
}

impl ChatOrchestrator {
    pub fn new(connection: ModelConnection) -> Result<Self, ExchangeError> {
        Ok(Self {
            client: ChatClient::new(connection)?,
            prompts: PromptBuilder::new()?,
        })
    }

    /// The message list actually sent: hidden system message first, then
    /// the caller's transcript unchanged.
    pub fn build_messages(&self, request: &ExchangeRequest) -> Result<Vec<Message>, PromptError> {
        let reference_context = if request.reference_documents.is_empty() {
            None
        } else {
            Some(build_reference_context(&request.reference_documents))
        };

        let system = self.prompts.build(
            request.mode,
            &request.typography,
            request.custom_instruction.as_deref(),
            reference_context.as_deref(),
        )?;

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(Message::system(system));
        messages.extend(request.messages.iter().cloned());
        Ok(messages)
    }

    /// Full prompt rendered for diagnostics: `[ROLE]` labelled blocks
    /// separated by rules, exactly what the request will carry.
    pub fn debug_prompt(&self, request: &ExchangeRequest) -> Result<String, PromptError> {
        let messages = self.build_messages(request)?;
        Ok(messages
            .iter()
            .map(|message| {
                format!(
                    "[{}]\n{}",
                    message.role.as_str().to_uppercase(),
                    message.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n"))
    }

    /// Run one exchange to settlement.
    ///
    /// Pre-stream failures (prompt rendering, configuration, HTTP
    /// non-success, connection refusal) return `Err` before any delta is
    /// produced. Once the stream is live the call always settles into an
    /// outcome: cancellation and mid-stream interruption keep the partial
    /// text and are distinguished by [`Termination`].
    pub async fn run(
        &self,
        request: ExchangeRequest,
        cancel: CancellationToken,
        sink: &mut dyn DeltaSink,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        let injected = self.build_messages(&request)?;

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(settle(request, String::new(), Termination::Cancelled));
            }
            result = self.client.stream_chat(&injected, cancel.clone()) => result?,
        };

        let mut raw_text = String::new();
        let mut termination = Termination::Completed;

        while let Some(item) = stream.next().await {
            match item {
                Ok(delta) => {
                    raw_text.push_str(&delta);
                    sink.on_delta(&delta).await;
                }
                Err(err) => {
                    termination = Termination::Interrupted(err);
                    break;
                }
            }
        }

        if cancel.is_cancelled() && matches!(termination, Termination::Completed) {
            termination = Termination::Cancelled;
        }

        info!(
            chars = raw_text.len(),
            complete = matches!(termination, Termination::Completed),
            "exchange settled"
        );

        Ok(settle(request, raw_text, termination))
    }
}

fn settle(
    request: ExchangeRequest,
    raw_text: String,
    termination: Termination,
) -> ExchangeOutcome {
    let guarded = guard_html(&raw_text, &request.typography);

    let mut messages = request.messages;
    if !raw_text.is_empty() {
        messages.push(Message::assistant(raw_text.clone()));
    }

    ExchangeOutcome {
        raw_text,
        html: guarded.html,
        report: guarded.report,
        messages,
        mode: request.mode,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> ChatOrchestrator {
        ChatOrchestrator::new(ModelConnection::new(
            "https://api.example.com",
            "test-key",
            "test-model",
        ))
        .unwrap()
    }

    fn request() -> ExchangeRequest {
        ExchangeRequest {
            mode: PromptMode::Generate,
            typography: TypographyDefaults::new("SimSun", 12.0),
            messages: vec![Message::user("Write a memo")],
            custom_instruction: None,
            reference_documents: Vec::new(),
        }
    }

    #[test]
    fn system_message_is_prepended() {
        let messages = orchestrator().build_messages(&request()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, crate::protocol::MessageRole::System);
        assert!(messages[0].content.contains("[Typography protocol"));
        assert_eq!(messages[1].content, "Write a memo");
    }

    #[test]
    fn debug_prompt_labels_roles() {
        let rendered = orchestrator().debug_prompt(&request()).unwrap();

        assert!(rendered.starts_with("[SYSTEM]\n"));
        assert!(rendered.contains("\n\n---\n\n[USER]\nWrite a memo"));
    }

    #[test]
    fn settle_appends_assistant_turn_and_guards() {
        let outcome = settle(
            request(),
            "<p style=\"margin:8px\">done</p>".to_string(),
            Termination::Completed,
        );

        assert!(outcome.is_complete());
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(
            outcome.messages[1].role,
            crate::protocol::MessageRole::Assistant
        );
        assert!(outcome.html.contains("margin:6pt"));
        assert_eq!(outcome.raw_text, "<p style=\"margin:8px\">done</p>");
    }

    #[test]
    fn settle_without_text_keeps_transcript_unchanged() {
        let outcome = settle(request(), String::new(), Termination::Cancelled);

        assert!(!outcome.is_complete());
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.raw_text.is_empty());
    }

    #[test]
    fn outcome_converts_into_history_item() {
        let outcome = settle(request(), "<p>x</p>".to_string(), Termination::Completed);
        let item = outcome.into_history("Memo");

        assert_eq!(item.title, "Memo");
        assert_eq!(item.mode, PromptMode::Generate);
        assert_eq!(item.final_html, "<p>x</p>");
        assert_eq!(item.messages.len(), 2);
    }
}
