//! Docforge core library
//!
//! Deterministic text-transformation pipeline behind a document-generation
//! assistant: a hidden system-prompt builder encoding the typography
//! protocol, an incremental SSE decoder reconstructing the token stream, an
//! orchestrator driving one exchange end to end, and a protocol guard that
//! rewrites arbitrary HTML into the constrained dialect that pastes cleanly
//! into a word processor.
//!
//! The crate is a UI-agnostic core. It performs no persistence and renders
//! nothing: callers hand in connection parameters, typography defaults and
//! a transcript, receive a stream of deltas while generation runs, and get
//! back guarded HTML plus a change report to store or display as they see
//! fit.

pub mod chat;
pub mod config;
pub mod guard;
pub mod prompt;
pub mod protocol;
pub mod providers;

pub use chat::{
    ChatOrchestrator, ChannelDeltaSink, DeltaSink, ExchangeError, ExchangeOutcome,
    ExchangeRequest, NullDeltaSink, Termination,
};
pub use config::{ApiKey, ConfigError, ModelConnection};
pub use guard::{enforced_body_style, guard_html, GuardReport, GuardedHtml};
pub use prompt::{build_reference_context, PromptBuilder, PromptError};
pub use protocol::{
    HistoryItem, Message, MessageRole, PromptMode, ReferenceDocument, TypographyDefaults,
};
pub use providers::{ChatClient, DeltaStream, ErrorCategory, ProviderError, SseDecoder};

/// Returns the version of the core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
