//! Streaming endpoint client and Server-Sent-Event decoding
//!
//! The endpoint is assumed OpenAI-compatible: a POST whose successful
//! response body is a sequence of SSE events carrying incremental content
//! deltas at `choices[0].delta.content`, terminated by a literal `[DONE]`
//! payload. The client surfaces transport failures before any delta is
//! produced; once the stream is live, individual malformed events are
//! skipped and only a dropped connection is reported as an error.

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::ChatClient;
pub use error::{ErrorCategory, ProviderError, ProviderResult};
pub use sse::{delta_stream, DeltaStream, SseDecoder};
