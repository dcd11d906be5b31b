//! [`ChatEngine`] implementation backed by llama-server's chat endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use npcllm_core::{ChatEngine, ChatRequest, EngineError, FragmentStream, extract};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::RuntimeError;
use crate::sse::fragment_stream;
use crate::supervisor::EngineProcess;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upstream error bodies are truncated to this many bytes in messages.
const MAX_ERROR_BODY: usize = 512;

/// Request body for `/v1/chat/completions`.
#[derive(Serialize)]
struct CompletionBody<'a> {
    #[serde(flatten)]
    request: &'a ChatRequest,
    stream: bool,
}

/// Generation engine that talks to a running llama-server.
///
/// At most `parallel` generations are in flight at once; further callers
/// wait for a slot in arrival order.
#[derive(Debug, Clone)]
pub struct LlamaServerEngine {
    client: Client,
    completions_url: String,
    slots: Arc<Semaphore>,
    request_timeout: Duration,
}

impl LlamaServerEngine {
    /// Create an engine for the llama-server at `base_url`.
    pub fn new(
        base_url: &str,
        parallel: usize,
        request_timeout: Duration,
    ) -> Result<Self, RuntimeError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            completions_url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            slots: Arc::new(Semaphore::new(parallel.max(1))),
            request_timeout,
        })
    }

    /// Create an engine for a started [`EngineProcess`].
    pub fn for_process(process: &EngineProcess, config: &EngineConfig) -> Result<Self, RuntimeError> {
        Self::new(process.base_url(), config.slots(), config.request_timeout)
    }

    /// Slots not currently held by a generation.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, EngineError> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Internal("generation gate closed".to_string()))
    }

    async fn post(&self, request: &ChatRequest, stream: bool) -> Result<Response, EngineError> {
        debug!(
            turns = request.turns().len(),
            max_tokens = request.max_tokens(),
            temperature = request.temperature(),
            stream,
            "Sending chat request to engine"
        );

        let mut builder = self
            .client
            .post(&self.completions_url)
            .json(&CompletionBody { request, stream });
        if !stream {
            builder = builder.timeout(self.request_timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_request_error(&e))?;
        check_status(response).await
    }

    fn map_request_error(&self, e: &reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout(self.request_timeout)
        } else if e.is_decode() {
            EngineError::Decode(e.to_string())
        } else {
            EngineError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl ChatEngine for LlamaServerEngine {
    async fn complete_once(&self, request: &ChatRequest) -> Result<String, EngineError> {
        let _slot = self.acquire_slot().await?;
        let response = self.post(request, false).await?;

        let reply: Value = response
            .json()
            .await
            .map_err(|e| self.map_request_error(&e))?;

        let text = extract::completion_text(&reply);
        if text.is_empty()
            && let Some(message) = extract::error_message(&reply)
        {
            return Err(EngineError::Generation(message));
        }
        Ok(text)
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        let slot = self.acquire_slot().await?;
        let response = self.post(request, true).await?;
        Ok(fragment_stream(response.bytes_stream(), Some(slot)))
    }
}

/// Turn a non-success upstream status into [`EngineError::Upstream`].
async fn check_status(response: Response) -> Result<Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| extract::error_message(&v))
        .unwrap_or_else(|| truncate(&body, MAX_ERROR_BODY).to_string());
    warn!(status = status.as_u16(), "Engine returned error: {message}");

    Err(EngineError::Upstream {
        status: status.as_u16(),
        message,
    })
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
