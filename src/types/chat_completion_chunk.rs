use serde::{Deserialize, Serialize};

use crate::types::{FinishReason, Role, Usage};

/// Incremental message content carried by a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Present on the first chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The next piece of generated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streamed chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The text added by this chunk.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the final chunk of the choice.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Groq-specific metadata attached to the final chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqChunkMetadata {
    /// Request identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Token accounting for the whole stream.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A `chat.completion.chunk` object delivered over server-sent events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    #[serde(default)]
    pub id: String,

    /// The model generating the stream.
    #[serde(default)]
    pub model: String,

    /// Choice deltas.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Token accounting in the OpenAI position.
    #[serde(default)]
    pub usage: Option<Usage>,

    /// Groq extension block.
    #[serde(default)]
    pub x_groq: Option<GroqChunkMetadata>,
}

impl ChatCompletionChunk {
    /// Text added to the first choice by this chunk, if any.
    pub fn text_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// Finish reason of the first choice, if this chunk ends it.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }

    /// Usage wherever the server chose to report it.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
            .or_else(|| self.x_groq.as_ref().and_then(|meta| meta.usage))
    }
}

/// Events produced while decoding a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    /// A decoded chunk.
    Chunk(ChatCompletionChunk),

    /// The `[DONE]` sentinel.
    Done,
}
