//! Engine startup and teardown.

use reqwest::Client;
use tokio::process::Child;
use tracing::{info, warn};

use crate::config::{EngineConfig, EngineLaunch};
use crate::error::RuntimeError;
use crate::process::{
    ENGINE_HOST, allocate_port, shutdown_child, spawn_engine, validate_port, wait_for_http_health,
};

/// A ready llama-server, either owned by this process or attached to.
#[derive(Debug)]
pub struct EngineProcess {
    base_url: String,
    child: Option<Child>,
}

impl EngineProcess {
    /// Base URL of the engine, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the engine process is owned (spawned) by this process.
    pub const fn is_managed(&self) -> bool {
        self.child.is_some()
    }

    /// PID of the owned child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Stop an owned engine. Attached engines are left running.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let Some(child) = self.child else {
            return Ok(());
        };
        info!(url = %self.base_url, "Stopping llama-server");
        let status = shutdown_child(child)
            .await
            .map_err(RuntimeError::Shutdown)?;
        info!(%status, "llama-server stopped");
        Ok(())
    }
}

/// Bring up the engine described by `config` and wait until it is ready.
///
/// A spawned engine that fails to become ready is stopped before the error is
/// returned.
pub async fn start_engine(config: &EngineConfig) -> Result<EngineProcess, RuntimeError> {
    let client = Client::builder().build()?;

    match &config.launch {
        EngineLaunch::Attach { base_url } => {
            let base_url = base_url.trim_end_matches('/').to_string();
            info!(url = %base_url, "Attaching to running llama-server");
            wait_for_http_health(&client, &base_url, config.startup_timeout, None).await?;
            Ok(EngineProcess {
                base_url,
                child: None,
            })
        }
        EngineLaunch::Spawn {
            llama_server_path,
            port,
            base_port,
        } => {
            let port = match port {
                Some(port) => validate_port(*port)?,
                None => allocate_port(*base_port)?,
            };
            let base_url = format!("http://{ENGINE_HOST}:{port}");

            let mut child = spawn_engine(llama_server_path, config, port)?;
            let ready =
                wait_for_http_health(&client, &base_url, config.startup_timeout, Some(&mut child))
                    .await;

            if let Err(e) = ready {
                warn!("llama-server failed to start: {e}");
                if let Err(stop) = shutdown_child(child).await {
                    warn!("Failed to stop llama-server after startup failure: {stop}");
                }
                return Err(e);
            }

            Ok(EngineProcess {
                base_url,
                child: Some(child),
            })
        }
    }
}
