//! Domain types for the inference gateway.
//!
//! These types are independent of HTTP and of any particular engine.

pub mod chat;
pub mod stream;

pub use chat::{
    ChatRequest, ChatResponse, ConversationTurn, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    MAX_STOP_SEQUENCES, MAX_TEMPERATURE, TurnRole,
};
pub use stream::{GenerationFragment, StreamEvent};
