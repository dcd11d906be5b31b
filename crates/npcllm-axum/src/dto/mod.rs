//! Wire types for gateway responses.

mod chat;
mod health;

pub use chat::{
    AssistantMessage, ChatCompletion, CompletionChoice, DeltaContent, StreamChunk, StreamDelta,
    StreamError,
};
pub use health::HealthBody;
