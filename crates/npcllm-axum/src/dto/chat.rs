//! Chat response bodies.

use npcllm_core::{ChatResponse, GenerationFragment, TurnRole};
use serde::{Deserialize, Serialize};

/// `POST /chat` response: `{id, choices: [{message: {role, content}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: TurnRole,
    pub content: String,
}

impl From<ChatResponse> for ChatCompletion {
    fn from(response: ChatResponse) -> Self {
        Self {
            id: response.id().to_string(),
            choices: vec![CompletionChoice {
                message: AssistantMessage {
                    role: response.role(),
                    content: response.content().to_string(),
                },
            }],
        }
    }
}

/// One streamed fragment: `{"choices": [{"delta": {"content": "..."}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub choices: Vec<StreamDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDelta {
    pub delta: DeltaContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaContent {
    pub content: String,
}

impl From<&GenerationFragment> for StreamChunk {
    fn from(fragment: &GenerationFragment) -> Self {
        Self {
            choices: vec![StreamDelta {
                delta: DeltaContent {
                    content: fragment.text().to_string(),
                },
            }],
        }
    }
}

/// Terminal failure event: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamError {
    pub error: String,
}
