//! Command building and spawning for llama-server.

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::RuntimeError;

/// Tracing target for lines forwarded from the engine's stdout and stderr.
pub const ENGINE_LOG_TARGET: &str = "npcllm::engine";

/// The engine only ever listens on loopback.
pub const ENGINE_HOST: &str = "127.0.0.1";

/// Build the llama-server command line for `config` on `port`.
pub fn build_command(llama_server_path: &Path, config: &EngineConfig, port: u16) -> Command {
    let mut cmd = Command::new(llama_server_path);
    cmd.arg("-m")
        .arg(&config.model_path)
        .arg("--host")
        .arg(ENGINE_HOST)
        .arg("--port")
        .arg(port.to_string())
        .arg("-c")
        .arg(config.ctx_size.to_string())
        .arg("-ngl")
        .arg(config.gpu_layers.to_string())
        .arg("-np")
        .arg(config.slots().to_string());

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn llama-server and attach log readers to its output.
pub fn spawn_engine(
    llama_server_path: &Path,
    config: &EngineConfig,
    port: u16,
) -> Result<Child, RuntimeError> {
    if !config.model_path.exists() {
        return Err(RuntimeError::ModelFileNotFound(config.model_path.clone()));
    }

    let mut cmd = build_command(llama_server_path, config, port);
    info!(
        binary = %llama_server_path.display(),
        model = %config.model_path.display(),
        port,
        ctx_size = config.ctx_size,
        gpu_layers = config.gpu_layers,
        parallel = config.slots(),
        "Spawning llama-server"
    );

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RuntimeError::BinaryNotFound {
            path: llama_server_path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => RuntimeError::NotExecutable {
            path: llama_server_path.to_path_buf(),
        },
        _ => RuntimeError::Spawn(e),
    })?;

    spawn_log_readers(&mut child);
    Ok(child)
}

/// Forward the child's stdout and stderr to tracing at debug level.
pub fn spawn_log_readers(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: ENGINE_LOG_TARGET, stream = "stdout", "{line}");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: ENGINE_LOG_TARGET, stream = "stderr", "{line}");
            }
        });
    }
}
