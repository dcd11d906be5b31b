//! Readiness polling for llama-server.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::process::Child;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::RuntimeError;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait until `GET {base_url}/health` returns 200.
///
/// llama-server answers 503 while the model is still loading, so any non-200
/// answer or connection error is retried until `timeout`. When `child` is
/// given, an early exit of the process fails the wait immediately.
pub async fn wait_for_http_health(
    client: &Client,
    base_url: &str,
    timeout: Duration,
    mut child: Option<&mut Child>,
) -> Result<(), RuntimeError> {
    let health_url = format!("{}/health", base_url.trim_end_matches('/'));
    info!("Waiting for llama-server to be ready at {health_url}");

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(child) = child.as_deref_mut()
            && let Some(status) = child.try_wait().map_err(RuntimeError::Spawn)?
        {
            return Err(RuntimeError::EngineExited(status.to_string()));
        }

        match client.get(&health_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("llama-server is ready at {base_url}");
                return Ok(());
            }
            Ok(response) => debug!(status = %response.status(), "Engine not ready yet"),
            Err(e) => debug!("Health check failed: {e}, retrying..."),
        }

        if Instant::now() + POLL_INTERVAL > deadline {
            return Err(RuntimeError::StartupTimeout {
                url: base_url.to_string(),
                timeout,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}
