// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod provider;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use client::Groq;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use provider::{
    Completion, CompletionProvider, ConversationMemory, GroqBinder, GroqOptions, GroqProvider,
    ProviderBinder,
};
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
