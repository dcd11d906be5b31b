//! Non-streaming chat completion.

use axum::Json;
use axum::extract::State;
use bytes::Bytes;
use npcllm_core::{ChatResponse, parse_chat_request};
use tracing::{debug, warn};

use crate::dto::ChatCompletion;
use crate::error::HttpError;
use crate::state::AppState;

/// `POST /chat`: generate the whole reply, then answer once.
pub async fn complete(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatCompletion>, HttpError> {
    let request = parse_chat_request(&body)?;
    debug!(
        turns = request.turns().len(),
        max_tokens = request.max_tokens(),
        "Chat completion requested"
    );

    let content = state.engine.complete_once(&request).await.map_err(|e| {
        warn!(error = %e, "Chat completion failed");
        HttpError::from(e)
    })?;

    let response = ChatResponse::assistant(state.ids.next_id(), content);
    debug!(id = response.id(), chars = response.content().len(), "Chat completion finished");
    Ok(Json(ChatCompletion::from(response)))
}
