//! API key middleware for the chat routes.

use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use npcllm_core::{API_KEY_HEADER, API_KEY_QUERY, ApiKeyGate, AuthError};

use crate::error::HttpError;
use crate::state::AppState;

/// Reject requests whose credential does not match the configured secret.
///
/// The credential comes from the `x-api-key` header, falling back to the
/// `api_key` query parameter. A header that is not valid UTF-8 still counts
/// as present and never matches. Rejected requests never reach the handler.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.gate.is_enabled() {
        return next.run(req).await;
    }

    let header = match req
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| std::str::from_utf8(v.as_bytes()))
    {
        Some(Err(_)) => return reject(&req, AuthError::Mismatch),
        Some(Ok(value)) => Some(value),
        None => None,
    };
    let query = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(API_KEY_QUERY));

    let credential = ApiKeyGate::select_credential(header, query.as_deref());
    match state.gate.check(credential) {
        Ok(()) => next.run(req).await,
        Err(e) => reject(&req, e),
    }
}

fn reject(req: &Request, reason: AuthError) -> Response {
    tracing::warn!(
        path = %req.uri().path(),
        reason = %reason,
        "Unauthorized chat request"
    );
    HttpError::from(reason).into_response()
}
