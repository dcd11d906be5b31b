#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

mod config;
mod engine;
mod error;
pub mod process;
mod sse;
mod supervisor;

pub use config::{
    DEFAULT_CTX_SIZE, DEFAULT_ENGINE_BASE_PORT, DEFAULT_GPU_LAYERS, DEFAULT_PARALLEL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_STARTUP_TIMEOUT, EngineConfig, EngineLaunch,
};
pub use engine::LlamaServerEngine;
pub use error::RuntimeError;
pub use sse::fragment_stream;
pub use supervisor::{EngineProcess, start_engine};
