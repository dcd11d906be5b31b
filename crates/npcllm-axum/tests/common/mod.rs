//! Shared helpers for router tests.

#![allow(dead_code)]

pub mod stub;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use npcllm_axum::{AppContext, CorsConfig, create_router};
use npcllm_core::ApiKeyGate;
use serde_json::Value;

pub const TEST_SECRET: &str = "guild-secret";
pub const TEST_MODEL_PATH: &str = "/models/npc-8b.Q4_K_M.gguf";

/// Router over `engine`, with auth enabled when `secret` is set.
pub fn app(engine: Arc<stub::StubEngine>, secret: Option<&str>) -> Router {
    let ctx = AppContext::new(
        engine,
        ApiKeyGate::new(secret.map(str::to_string)),
        TEST_MODEL_PATH,
    );
    create_router(Arc::new(ctx), &CorsConfig::Disabled)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn hello_request() -> Value {
    serde_json::json!({
        "messages": [
            {"role": "system", "content": "You are Mira, the innkeeper."},
            {"role": "user", "content": "Any rooms free tonight?"}
        ],
        "max_tokens": 64
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `data:` payloads of an SSE body, in order. Comments are skipped.
pub fn sse_data(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter_map(|event| {
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            (!data.is_empty()).then(|| data.join("\n"))
        })
        .collect()
}
