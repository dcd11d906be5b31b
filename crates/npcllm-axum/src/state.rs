//! Shared application state type.

use std::fmt;
use std::sync::Arc;

use npcllm_core::{ApiKeyGate, ChatEngine, ResponseIdGenerator};

/// Services needed by the HTTP handlers. Immutable after startup.
pub struct AppContext {
    pub engine: Arc<dyn ChatEngine>,
    pub gate: ApiKeyGate,
    pub ids: ResponseIdGenerator,
    /// Reported by `/health`.
    pub model_path: String,
}

impl AppContext {
    pub fn new(engine: Arc<dyn ChatEngine>, gate: ApiKeyGate, model_path: impl Into<String>) -> Self {
        Self {
            engine,
            gate,
            ids: ResponseIdGenerator::new(),
            model_path: model_path.into(),
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("engine", &self.engine)
            .field("auth_enabled", &self.gate.is_enabled())
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

/// Application state shared across all handlers.
pub type AppState = Arc<AppContext>;
