//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where the engine runtime and the HTTP
//! adapter are wired together.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use npcllm_core::{ApiKeyGate, ChatEngine};
use npcllm_runtime::{EngineConfig, EngineProcess, LlamaServerEngine, start_engine};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::routes::create_router;
use crate::state::{AppContext, AppState};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// No CORS headers are sent.
    #[default]
    Disabled,
    /// Allow all origins.
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

impl CorsConfig {
    /// Interpret a configured origin list: empty disables CORS, `*` allows all.
    pub fn from_origins(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() {
            Self::Disabled
        } else if origins.iter().any(|o| o == "*") {
            Self::AllowAll
        } else {
            Self::AllowOrigins(origins)
        }
    }
}

/// Server configuration for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Shared secret; `None` or empty disables auth.
    pub api_key: Option<String>,
    pub cors: CorsConfig,
    pub engine: EngineConfig,
}

/// Start the engine and build the handler state.
///
/// The returned [`EngineProcess`] must be shut down by the caller.
pub async fn bootstrap(config: &ServerConfig) -> Result<(AppState, EngineProcess)> {
    let process = start_engine(&config.engine)
        .await
        .context("Failed to start llama-server")?;

    let engine = match LlamaServerEngine::for_process(&process, &config.engine) {
        Ok(engine) => engine,
        Err(e) => {
            process.shutdown().await.ok();
            return Err(e).context("Failed to create engine client");
        }
    };
    let engine: Arc<dyn ChatEngine> = Arc::new(engine);

    let gate = ApiKeyGate::new(config.api_key.clone());
    if gate.is_enabled() {
        info!("API key authentication enabled");
    } else {
        warn!("No API key configured; chat endpoints are open");
    }

    let ctx = AppContext::new(
        engine,
        gate,
        config.engine.model_path.display().to_string(),
    );
    Ok((Arc::new(ctx), process))
}

/// Serve `app` on `listener` until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("HTTP server error")
}

/// Run the gateway until `shutdown` is cancelled, then stop the engine.
pub async fn start_server(config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let addr: SocketAddr = listener.local_addr()?;

    let (state, process) = bootstrap(&config).await?;
    let app = create_router(state, &config.cors);

    info!(
        engine = %process.base_url(),
        engine_pid = ?process.pid(),
        model = %config.engine.model_path.display(),
        "npcllm gateway listening on http://{addr}"
    );

    let served = serve(listener, app, shutdown).await;
    info!("Gateway stopped, shutting down engine");
    process
        .shutdown()
        .await
        .context("Failed to stop llama-server")?;
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_from_origins() {
        assert_eq!(CorsConfig::from_origins(vec![]), CorsConfig::Disabled);
        assert_eq!(
            CorsConfig::from_origins(vec![" ".into()]),
            CorsConfig::Disabled
        );
        assert_eq!(
            CorsConfig::from_origins(vec!["http://localhost:3000".into(), "*".into()]),
            CorsConfig::AllowAll
        );
        assert_eq!(
            CorsConfig::from_origins(vec!["http://localhost:3000".into()]),
            CorsConfig::AllowOrigins(vec!["http://localhost:3000".into()])
        );
    }
}
