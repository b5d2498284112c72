//! Hidden system-prompt assembly
//!
//! The typography protocol is never shown to the user; it is injected as a
//! system message ahead of every exchange. Construction order is part of the
//! contract: the model weighs earlier rules more heavily, so the
//! inline-style-only rule always comes first and the optional user/context
//! sections always come last.

mod builder;
mod engine;

pub use builder::{build_reference_context, PromptBuilder, PROTOCOL_RULES};

use thiserror::Error;

/// Errors raised while rendering prompt templates
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template error: {0}")]
    Template(#[from] tera::Error),
}
