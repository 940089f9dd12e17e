use serde::{Deserialize, Serialize};

use crate::types::{FinishReason, KnownModel, Message, Usage};

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model that will complete the conversation.
    pub model: KnownModel,

    /// The conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Whether the response is delivered as server-sent events.
    #[serde(default)]
    pub stream: bool,

    /// Sampling temperature between 0 and 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionParams {
    /// Create non-streaming parameters for the given model and messages.
    pub fn new(model: KnownModel, messages: Vec<Message>) -> Self {
        Self {
            model,
            messages,
            stream: false,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Request a streamed response.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// One candidate completion in a non-streaming response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated assistant message.
    pub message: Message,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Response body of a non-streaming `chat/completions` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Unique identifier of the completion.
    #[serde(default)]
    pub id: String,

    /// The model that produced the completion, as reported by the server.
    #[serde(default)]
    pub model: String,

    /// Candidate completions; this client only ever asks for one.
    pub choices: Vec<Choice>,

    /// Token accounting, when reported.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// The text of the first choice, or an empty string when there is none.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("")
    }

    /// The finish reason of the first choice.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }
}
