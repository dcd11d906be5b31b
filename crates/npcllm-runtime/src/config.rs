//! Startup-time engine configuration.
//!
//! Everything here is fixed for the lifetime of the process. Per-request
//! generation parameters travel with each `ChatRequest` instead.

use std::path::PathBuf;
use std::time::Duration;

/// Default context window passed to llama-server (`-c`).
pub const DEFAULT_CTX_SIZE: u32 = 4096;

/// Default number of layers offloaded to the GPU (`-ngl`).
pub const DEFAULT_GPU_LAYERS: u32 = 1;

/// Default number of concurrent generations (`-np` and semaphore permits).
pub const DEFAULT_PARALLEL: usize = 1;

/// First port tried when allocating a port for a spawned llama-server.
pub const DEFAULT_ENGINE_BASE_PORT: u16 = 9000;

/// How long to wait for llama-server to report ready.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound for a single non-streaming generation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// How the engine process is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLaunch {
    /// Spawn and own a llama-server child process.
    Spawn {
        /// Binary to run; a bare name is resolved through `PATH`.
        llama_server_path: PathBuf,
        /// Fixed port, or `None` to allocate one from `base_port`.
        port: Option<u16>,
        base_port: u16,
    },
    /// Use a llama-server that is already running at this base URL.
    Attach { base_url: String },
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// GGUF model file served by the engine.
    pub model_path: PathBuf,
    pub launch: EngineLaunch,
    pub ctx_size: u32,
    pub gpu_layers: u32,
    pub parallel: usize,
    pub startup_timeout: Duration,
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Spawn `llama_server_path` for `model_path` with default tuning.
    pub fn spawn(model_path: impl Into<PathBuf>, llama_server_path: impl Into<PathBuf>) -> Self {
        Self::with_launch(
            model_path,
            EngineLaunch::Spawn {
                llama_server_path: llama_server_path.into(),
                port: None,
                base_port: DEFAULT_ENGINE_BASE_PORT,
            },
        )
    }

    /// Attach to an already-running llama-server at `base_url`.
    pub fn attach(model_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self::with_launch(
            model_path,
            EngineLaunch::Attach {
                base_url: base_url.into(),
            },
        )
    }

    fn with_launch(model_path: impl Into<PathBuf>, launch: EngineLaunch) -> Self {
        Self {
            model_path: model_path.into(),
            launch,
            ctx_size: DEFAULT_CTX_SIZE,
            gpu_layers: DEFAULT_GPU_LAYERS,
            parallel: DEFAULT_PARALLEL,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Number of generation slots, never less than one.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.parallel.max(1)
    }
}
