//! Mock llama-server for runtime integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Shared state of the mock server.
#[derive(Debug, Default)]
pub struct MockState {
    /// `/health` answers 503 this many times before answering 200.
    pub loading_polls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub completion_calls: AtomicUsize,
}

/// Start the mock on an ephemeral port and return its base URL.
pub async fn spawn_mock(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/chat/completions", post(completions))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn health(State(state): State<Arc<MockState>>) -> Response {
    let calls = state.health_calls.fetch_add(1, Ordering::SeqCst);
    if calls < state.loading_polls.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "Loading model"}})),
        )
            .into_response();
    }
    Json(json!({"status": "ok"})).into_response()
}

/// Behaviour is keyed on the content of the last message.
async fn completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.completion_calls.fetch_add(1, Ordering::SeqCst);

    let last = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    let streaming = body["stream"].as_bool().unwrap_or(false);

    match (last.as_str(), streaming) {
        ("fail", _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"code": 500, "message": "slot unavailable"}})),
        )
            .into_response(),
        ("params", false) => Json(json!({
            "choices": [{"message": {"role": "assistant", "content": format!(
                "{}|{}|{}",
                body["max_tokens"], body["temperature"], body["stop"]
            )}}]
        }))
        .into_response(),
        ("odd shape", false) => Json(json!({"output": "from output"})).into_response(),
        (text, false) => Json(json!({
            "choices": [{"message": {"role": "assistant", "content": format!("echo: {text}")}}]
        }))
        .into_response(),
        ("hold", true) => {
            let first: Result<Bytes, Infallible> = Ok(Bytes::from(sse_delta("wait")));
            let stream = futures_util::stream::iter(vec![first])
                .chain(futures_util::stream::pending());
            sse_response(Body::from_stream(stream))
        }
        ("break", true) => sse_response(Body::from(format!(
            "{}data: {{\"error\":{{\"message\":\"kv cache full\"}}}}\n\n",
            sse_delta("Hel")
        ))),
        (_, true) => sse_response(Body::from(format!(
            "{}{}data: [DONE]\n\n",
            sse_delta("Hel"),
            sse_delta("lo")
        ))),
    }
}

pub fn sse_delta(text: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {"content": text}}]})
    )
}

fn sse_response(body: Body) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(body)
        .unwrap()
}
