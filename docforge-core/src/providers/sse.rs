//! Incremental Server-Sent-Event decoding for streamed completions
//!
//! The transport may split or merge event boundaries arbitrarily, so the
//! decoder owns a carry-over buffer and only acts on complete events. An
//! event is the group of lines terminated by a blank line; within it, every
//! `data:` line is examined. The literal `[DONE]` payload ends the sequence
//! with precedence over anything still buffered, and a data line that fails
//! to decode is dropped without aborting the stream.

use super::error::{ProviderError, ProviderResult};
use super::types::ChatCompletionChunk;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Sentinel payload marking the end of the stream
pub const STREAM_TERMINATOR: &str = "[DONE]";

const DATA_PREFIX: &str = "data:";

/// Lazy, finite, non-restartable sequence of content deltas
pub type DeltaStream = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

/// Push parser reconstructing content deltas from raw response chunks.
///
/// One decoder serves exactly one streaming call; its buffers die with it.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current line, carried until a newline arrives. Kept as
    /// bytes so a chunk split inside a UTF-8 sequence stays intact.
    line: Vec<u8>,

    /// Complete lines of the event under construction.
    event: Vec<String>,

    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the terminator payload has been observed; later feeds are
    /// ignored.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume one transport chunk and return the content deltas it
    /// completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.finished {
            return deltas;
        }

        for &byte in chunk {
            if byte != b'\n' {
                self.line.push(byte);
                continue;
            }

            let mut line = std::mem::take(&mut self.line);
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            match String::from_utf8(line) {
                Ok(text) if text.trim().is_empty() => {
                    self.dispatch_event(&mut deltas);
                    if self.finished {
                        return deltas;
                    }
                }
                Ok(text) => self.event.push(text),
                Err(err) => {
                    tracing::warn!("discarding non-utf8 stream line: {err}");
                }
            }
        }

        deltas
    }

    /// Process a completed event: extract its `data:` lines, honor the
    /// terminator, decode payloads and collect non-empty content deltas.
    fn dispatch_event(&mut self, deltas: &mut Vec<String>) {
        let lines = std::mem::take(&mut self.event);
        for line in &lines {
            let Some(value) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let value = value.strip_prefix(' ').unwrap_or(value);

            if value.trim() == STREAM_TERMINATOR {
                self.finished = true;
                return;
            }

            let chunk: ChatCompletionChunk = match serde_json::from_str(value) {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!("skipping malformed stream event: {err}");
                    continue;
                }
            };

            if let Some(content) = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
            {
                if !content.is_empty() {
                    deltas.push(content);
                }
            }
        }
    }
}

/// Adapt a raw byte stream into a cancellable stream of content deltas.
///
/// Cancellation is checked between chunk reads: triggering the token aborts
/// the in-flight read and ends the sequence quietly, without flushing a
/// partial event. A transport error after the stream started surfaces as a
/// single `StreamInterrupted` item before the sequence ends, so the caller
/// can treat what it already received as partial text.
pub fn delta_stream<S>(bytes: S, cancel: CancellationToken) -> DeltaStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut decoder = SseDecoder::new();
        tokio::pin!(bytes);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = bytes.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for delta in decoder.feed(&chunk) {
                        yield Ok(delta);
                    }
                    if decoder.is_finished() {
                        break;
                    }
                }
                Some(Err(err)) => {
                    yield Err(ProviderError::StreamInterrupted(err.to_string()));
                    break;
                }
                None => break,
            }
        }
    })
}
