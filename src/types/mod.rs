// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod finish_reason;
pub mod message;
pub mod model;
pub mod usage;

// Re-exports
pub use chat_completion::{ChatCompletion, ChatCompletionParams, Choice};
pub use chat_completion_chunk::{
    ChatCompletionChunk, ChatStreamEvent, ChunkChoice, ChunkDelta, GroqChunkMetadata,
};
pub use finish_reason::{FinishReason, FinishReasonParseError};
pub use message::{Message, Role};
pub use model::{KnownModel, ModelParseError};
pub use usage::Usage;
