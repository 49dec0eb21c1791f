//! # Server-Sent Events decoding
//!
//! Both model adapters stream over SSE: each event carries one JSON document in
//! a `data:` line. Network chunks do not respect line (or even UTF-8)
//! boundaries, so bytes are buffered until a full line is available.

use super::TextStream;
use crate::errors::ProviderError;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, warn};

/// The sentinel some OpenAI-compatible servers send after the last event.
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder turning raw bytes into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns every complete `data:` payload it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = Self::data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Self::data_payload(&line)
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);
        if data.is_empty() || data == DONE_SENTINEL {
            return None;
        }
        Some(data.to_string())
    }
}

struct SseState<S, F> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    parse: F,
    pending: VecDeque<Result<String, ProviderError>>,
    done: bool,
}

impl<S, F> SseState<S, F>
where
    F: Fn(&str) -> Result<Option<String>, ProviderError>,
{
    /// Queues parsed fragments; stops at the first error so nothing is emitted after it.
    fn enqueue(&mut self, payloads: impl IntoIterator<Item = String>) {
        for payload in payloads {
            match (self.parse)(&payload) {
                Ok(Some(text)) if !text.is_empty() => self.pending.push_back(Ok(text)),
                Ok(_) => debug!("Skipping SSE event without text payload"),
                Err(e) => {
                    warn!("AI provider stream reported an error: {e}");
                    self.pending.push_back(Err(e));
                    self.done = true;
                    return;
                }
            }
        }
    }
}

/// Turns an SSE byte stream into a stream of text fragments.
///
/// `parse` maps one `data:` payload to its text (or `None` for events that
/// carry no text). Order of arrival is preserved and the stream ends after the
/// first error.
pub fn text_stream<S, B, F>(bytes: S, parse: F) -> TextStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    F: Fn(&str) -> Result<Option<String>, ProviderError> + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        parse,
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(chunk.as_ref());
                    state.enqueue(payloads);
                }
                Some(Err(e)) => {
                    state.done = true;
                    state
                        .pending
                        .push_back(Err(ProviderError::Stream(e.without_url().to_string())));
                }
                None => {
                    state.done = true;
                    let tail = state.decoder.finish();
                    state.enqueue(tail);
                }
            }
        }
    }))
}
