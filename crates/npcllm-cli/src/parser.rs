//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use npcllm_axum::{CorsConfig, ServerConfig};
use npcllm_runtime::{DEFAULT_ENGINE_BASE_PORT, EngineConfig, EngineLaunch};

/// Local HTTP gateway for a llama.cpp chat model.
///
/// Every option can also be set through the environment variable shown in
/// `--help`.
#[derive(Debug, Parser)]
#[command(name = "npcllm")]
#[command(about = "Serve a local GGUF chat model over HTTP")]
#[command(version)]
pub struct Cli {
    /// GGUF model file to serve
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: PathBuf,

    /// Shared secret required on chat requests; empty disables auth
    #[arg(long, env = "MODEL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Listen address
    #[arg(long, env = "MODEL_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "MODEL_PORT", default_value_t = 8000)]
    pub port: u16,

    /// llama-server binary to spawn
    #[arg(long = "llama-server", env = "LLAMA_SERVER_PATH", default_value = "llama-server")]
    pub llama_server: PathBuf,

    /// Attach to a running llama-server instead of spawning one
    #[arg(long, env = "ENGINE_URL")]
    pub engine_url: Option<String>,

    /// Port for the spawned llama-server (allocated from 9000 when unset)
    #[arg(long, env = "ENGINE_PORT")]
    pub engine_port: Option<u16>,

    /// Engine context window in tokens
    #[arg(long, env = "MODEL_CTX_SIZE", default_value_t = npcllm_runtime::DEFAULT_CTX_SIZE)]
    pub ctx_size: u32,

    /// Layers offloaded to the GPU
    #[arg(long, env = "MODEL_GPU_LAYERS", default_value_t = npcllm_runtime::DEFAULT_GPU_LAYERS)]
    pub gpu_layers: u32,

    /// Concurrent generations
    #[arg(
        long,
        env = "MODEL_PARALLEL",
        default_value_t = npcllm_runtime::DEFAULT_PARALLEL,
        value_parser = parse_parallel
    )]
    pub parallel: usize,

    /// Seconds to wait for the engine to become ready
    #[arg(long = "startup-timeout", env = "ENGINE_STARTUP_TIMEOUT_SECS", default_value_t = 120)]
    pub startup_timeout_secs: u64,

    /// Seconds allowed for one non-streaming generation
    #[arg(long = "request-timeout", env = "ENGINE_REQUEST_TIMEOUT_SECS", default_value_t = 600)]
    pub request_timeout_secs: u64,

    /// Allowed CORS origin; repeat or comma-separate, `*` allows all
    #[arg(long = "cors-origin", env = "MODEL_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Enable debug logging when RUST_LOG is unset
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

fn parse_parallel(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err("must be at least 1".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// How the engine should be obtained.
    pub fn engine_launch(&self) -> EngineLaunch {
        match self.engine_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => EngineLaunch::Attach {
                base_url: url.to_string(),
            },
            _ => EngineLaunch::Spawn {
                llama_server_path: self.llama_server.clone(),
                port: self.engine_port,
                base_port: DEFAULT_ENGINE_BASE_PORT,
            },
        }
    }

    /// Build the gateway configuration.
    pub fn server_config(&self) -> ServerConfig {
        let engine = EngineConfig {
            model_path: self.model_path.clone(),
            launch: self.engine_launch(),
            ctx_size: self.ctx_size,
            gpu_layers: self.gpu_layers,
            parallel: self.parallel,
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        };

        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            cors: CorsConfig::from_origins(self.cors_origins.clone()),
            engine,
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
