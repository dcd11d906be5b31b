//! Error types for engine startup and shutdown.
//!
//! Request-time failures are `npcllm_core::EngineError`; this type only covers
//! getting the engine running and stopping it again.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while starting or stopping the engine.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The llama-server binary could not be found
    #[error("llama-server binary not found: {}", path.display())]
    BinaryNotFound { path: PathBuf },

    /// The binary exists but cannot be executed
    #[error("llama-server binary is not executable: {}", path.display())]
    NotExecutable { path: PathBuf },

    /// The configured model file does not exist
    #[error("Model file not found: {}", .0.display())]
    ModelFileNotFound(PathBuf),

    /// Spawning the process failed for another reason
    #[error("Failed to spawn llama-server: {0}")]
    Spawn(#[source] std::io::Error),

    /// Ports below 1024 are refused
    #[error("Port {0} is privileged. Use >= 1024.")]
    PrivilegedPort(u16),

    /// The requested port is already bound
    #[error("Port {0} is in use.")]
    PortInUse(u16),

    /// No free port in the allocation window
    #[error("No available ports in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    /// The process exited before it became ready
    #[error("llama-server exited during startup ({0})")]
    EngineExited(String),

    /// The health endpoint never reported ready
    #[error("llama-server not ready within {}s at {url}", timeout.as_secs())]
    StartupTimeout { url: String, timeout: Duration },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Stopping the process failed
    #[error("Failed to stop llama-server: {0}")]
    Shutdown(#[source] std::io::Error),
}
