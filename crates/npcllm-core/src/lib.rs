#![doc = include_str!("../README.md")]

pub mod auth;
pub mod domain;
pub mod extract;
pub mod ids;
pub mod ports;
pub mod validation;

// Re-export commonly used types for convenience
pub use auth::{API_KEY_HEADER, API_KEY_QUERY, ApiKeyGate, AuthError};
pub use domain::{
    ChatRequest, ChatResponse, ConversationTurn, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    GenerationFragment, MAX_STOP_SEQUENCES, StreamEvent, TurnRole,
};
pub use ids::{RESPONSE_ID_PREFIX, ResponseIdGenerator};
pub use ports::{ChatEngine, EngineError, FragmentStream};
pub use validation::{ValidationError, ValidationIssue, parse_chat_request, validate_chat_request};
