//! Protocol module for the typography-protocol data model
//!
//! This module defines the canonical data structures shared by the prompt
//! builder, the streaming client and the protocol guard. They are designed
//! to be:
//! - Host-shell agnostic (plain data in, plain data out)
//! - Serializable in the camelCase shape the persistence boundary expects
//! - Free of hidden mutable state so every pipeline stage stays replayable

pub mod types;

pub use types::{
    HistoryItem, Message, MessageRole, PromptMode, ReferenceDocument, TypographyDefaults,
};
