//! Re-framing of llama-server's SSE stream into generation fragments.
//!
//! Upstream format: `data: {"choices":[{"delta":{"content":"hi"}}]}\n\n`,
//! terminated by `data: [DONE]`. An `{"error": ...}` payload ends the
//! stream with an error; end of body without `[DONE]` is a truncation.

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use npcllm_core::{EngineError, FragmentStream, GenerationFragment, extract};
use serde_json::Value;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, warn};

/// State threaded through the `unfold` stream.
struct UpstreamState<E> {
    stream: BoxStream<'static, Result<Bytes, E>>,
    buf: BytesMut,
    /// Slot held for the life of the generation; released on terminal or drop.
    permit: Option<OwnedSemaphorePermit>,
    fragments: usize,
    eof: bool,
    done: bool,
}

impl<E> UpstreamState<E> {
    fn finish(&mut self) {
        self.done = true;
        self.permit = None;
    }
}

impl<E> Drop for UpstreamState<E> {
    fn drop(&mut self) {
        if !self.done {
            debug!(
                fragments = self.fragments,
                "Generation stream dropped before completion"
            );
        }
    }
}

/// Convert an upstream SSE byte stream into a [`FragmentStream`].
///
/// The stream yields fragments in upstream order and ends after `[DONE]`, or
/// after exactly one `Err`. `permit` is released as soon as the stream
/// reaches a terminal state or is dropped.
pub fn fragment_stream<S, E>(byte_stream: S, permit: Option<OwnedSemaphorePermit>) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = UpstreamState {
        stream: byte_stream.boxed(),
        buf: BytesMut::new(),
        permit,
        fragments: 0,
        eof: false,
        done: false,
    };

    let stream = futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                match parse_line(&line) {
                    Line::Skip => continue,
                    Line::Done => {
                        st.finish();
                        return None;
                    }
                    Line::Fragment(fragment) => {
                        st.fragments += 1;
                        return Some((Ok(fragment), st));
                    }
                    Line::Failed(err) => {
                        st.finish();
                        return Some((Err(err), st));
                    }
                }
            }

            if st.eof {
                warn!(
                    fragments = st.fragments,
                    "Engine stream ended without [DONE]"
                );
                st.finish();
                return Some((Err(EngineError::Truncated), st));
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("Engine stream error: {e}");
                    st.finish();
                    return Some((Err(EngineError::Unavailable(e.to_string())), st));
                }
                None => {
                    // Flush a trailing line that lacks its newline.
                    st.eof = true;
                    if !st.buf.is_empty() {
                        st.buf.extend_from_slice(b"\n");
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

enum Line {
    Skip,
    Done,
    Fragment(GenerationFragment),
    Failed(EngineError),
}

fn parse_line(line: &[u8]) -> Line {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return Line::Skip;
    }
    // `event:`, `id:` and `retry:` fields carry nothing we use.
    let Some(data) = trimmed.strip_prefix("data:") else {
        return Line::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Line::Done;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(chunk) => {
            if let Some(message) = extract::error_message(&chunk) {
                return Line::Failed(EngineError::Generation(message));
            }
            extract::delta_text(&chunk)
                .and_then(GenerationFragment::new)
                .map_or(Line::Skip, Line::Fragment)
        }
        Err(e) => Line::Failed(EngineError::Decode(format!("invalid stream chunk: {e}"))),
    }
}

fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
