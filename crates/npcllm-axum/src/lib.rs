#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{CorsConfig, ServerConfig, bootstrap, serve, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::{AppContext, AppState};
