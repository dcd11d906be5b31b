//! SSE encoding of a chat generation.
//!
//! A generation moves through `Started -> Streaming -> Finished`. Each step
//! yields one event, and entering `Finished` always yields the single
//! terminal event (`[DONE]` or `{"error": ...}`); nothing follows it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event;
use futures_util::{Stream, StreamExt};
use npcllm_core::{ChatEngine, ChatRequest, FragmentStream, StreamEvent};
use serde::Serialize;
use tracing::{debug, warn};

use crate::dto::{StreamChunk, StreamError};

/// Data of the success terminal event.
pub const DONE_MARKER: &str = "[DONE]";

enum Phase {
    /// Engine not yet asked; the first poll starts the generation.
    Started {
        engine: Arc<dyn ChatEngine>,
        request: ChatRequest,
    },
    Streaming(FragmentStream),
    Finished,
}

/// Logs streams abandoned before their terminal event.
struct Progress {
    fragments: usize,
    terminated: bool,
}

impl Drop for Progress {
    fn drop(&mut self) {
        if !self.terminated {
            debug!(
                fragments = self.fragments,
                "Client disconnected before the stream finished"
            );
        }
    }
}

/// Build the event stream for one generation.
///
/// The engine is only called once the response is being polled, so a client
/// that waits for a busy engine still receives keep-alives.
pub fn chat_events(
    engine: Arc<dyn ChatEngine>,
    request: ChatRequest,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let state = (
        Phase::Started { engine, request },
        Progress {
            fragments: 0,
            terminated: false,
        },
    );

    futures_util::stream::unfold(state, |(phase, mut progress)| async move {
        let (event, fragments) = match phase {
            Phase::Started { engine, request } => match engine.complete_stream(&request).await {
                Ok(mut fragments) => (next_event(&mut fragments).await, Some(fragments)),
                Err(e) => (StreamEvent::Error(e.to_string()), None),
            },
            Phase::Streaming(mut fragments) => (next_event(&mut fragments).await, Some(fragments)),
            Phase::Finished => return None,
        };

        let next = match fragments {
            Some(fragments) if !event.is_terminal() => Phase::Streaming(fragments),
            _ => Phase::Finished,
        };
        progress.record(&event);
        Some((Ok(to_sse(&event)), (next, progress)))
    })
}

async fn next_event(fragments: &mut FragmentStream) -> StreamEvent {
    match fragments.next().await {
        Some(Ok(fragment)) => StreamEvent::Fragment(fragment),
        Some(Err(e)) => StreamEvent::Error(e.to_string()),
        None => StreamEvent::Done,
    }
}

impl Progress {
    fn record(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Fragment(_) => self.fragments += 1,
            StreamEvent::Done => {
                self.terminated = true;
                debug!(fragments = self.fragments, "Chat stream finished");
            }
            StreamEvent::Error(error) => {
                self.terminated = true;
                warn!(%error, fragments = self.fragments, "Chat stream failed");
            }
        }
    }
}

/// Encode one event as an SSE `data:` frame.
pub fn to_sse(event: &StreamEvent) -> Event {
    match event {
        StreamEvent::Fragment(fragment) => json_event(&StreamChunk::from(fragment)),
        StreamEvent::Done => Event::default().data(DONE_MARKER),
        StreamEvent::Error(error) => json_event(&StreamError {
            error: error.clone(),
        }),
    }
}

fn json_event<T: Serialize>(value: &T) -> Event {
    match serde_json::to_string(value) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            warn!("Failed to serialize stream event: {e}");
            Event::default().data(r#"{"error":"failed to encode event"}"#)
        }
    }
}
