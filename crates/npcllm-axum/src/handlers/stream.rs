//! Streaming chat completion over server-sent events.

use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderName;
use axum::http::header::HeaderValue;
use axum::response::sse::KeepAlive;
use axum::response::{IntoResponse, Response, Sse};
use bytes::Bytes;
use npcllm_core::parse_chat_request;
use tracing::debug;

use crate::error::HttpError;
use crate::sse::chat_events;
use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `POST /chat/stream`: one event per fragment, then one terminal event.
///
/// Invalid requests are rejected with a plain error response. Once the
/// request is valid the status is always 200 and engine failures arrive as
/// the terminal `{"error": ...}` event.
pub async fn stream(State(state): State<AppState>, body: Bytes) -> Result<Response, HttpError> {
    let request = parse_chat_request(&body)?;
    debug!(
        turns = request.turns().len(),
        max_tokens = request.max_tokens(),
        "Chat stream requested"
    );

    let events = chat_events(state.engine.clone(), request);
    let sse = Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("ping"),
    );

    Ok((
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        sse,
    )
        .into_response())
}
