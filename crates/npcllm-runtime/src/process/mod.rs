//! llama-server process management.
//!
//! Spawning, readiness polling, port selection and shutdown for the engine
//! child process.

mod command;
mod health;
mod ports;
mod shutdown;

pub use command::{ENGINE_LOG_TARGET, ENGINE_HOST, build_command, spawn_engine, spawn_log_readers};
pub use health::wait_for_http_health;
pub use ports::{PORT_WINDOW, allocate_port, is_port_available, validate_port};
pub use shutdown::shutdown_child;
