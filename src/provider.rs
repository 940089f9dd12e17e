//! Completion providers.
//!
//! A [`CompletionProvider`] is a binding to one model together with the
//! conversation memory accumulated through it.  Bindings are created by a
//! [`ProviderBinder`]; throwing a binding away and binding again is how the
//! chat resets provider-side context.

use std::time::Duration;

use futures::StreamExt;

use crate::chat::ChatConfig;
use crate::client::Groq;
use crate::error::{Error, Result};
use crate::observability::PROVIDER_BINDINGS;
use crate::render::Renderer;
use crate::types::{
    ChatCompletionParams, ChatStreamEvent, FinishReason, KnownModel, Message, Usage,
};

/// The outcome of a successful completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The full generated text.
    pub content: String,
    /// Why generation stopped, when the server said.
    pub finish_reason: Option<FinishReason>,
    /// Token accounting, when the server reported it.
    pub usage: Option<Usage>,
}

impl Completion {
    /// A completion with only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: None,
            usage: None,
        }
    }
}

/// Unbounded buffer of the exchanges made through one binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationMemory {
    system_prompt: Option<String>,
    messages: Vec<Message>,
}

impl ConversationMemory {
    /// Creates an empty memory framed by an optional system prompt.
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            system_prompt,
            messages: Vec::new(),
        }
    }

    /// Records one completed exchange.
    pub fn record_turn(&mut self, prompt: &str, reply: &str) {
        self.messages.push(Message::user(prompt));
        self.messages.push(Message::assistant(reply));
    }

    /// Remembered messages, oldest first, excluding the system prompt.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of remembered exchanges.
    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }

    /// True if nothing has been remembered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The message list for a request that continues this conversation.
    pub fn request_messages(&self, prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(self.messages.iter().cloned());
        messages.push(Message::user(prompt));
        messages
    }
}

/// A model binding with its own conversation memory.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// The model this binding talks to.
    fn model(&self) -> KnownModel;

    /// The conversation remembered by this binding.
    fn memory(&self) -> &ConversationMemory;

    /// Continues the remembered conversation with `prompt`.
    ///
    /// Text is streamed into `renderer` as it arrives.  On success the
    /// exchange is added to memory; on failure memory is left unchanged.
    async fn complete(&mut self, prompt: &str, renderer: &mut dyn Renderer) -> Result<Completion>;

    /// Sends `prompt` on its own, without memory and without recording it.
    async fn generate(&self, prompt: &str) -> Result<Completion>;
}

/// Creates provider bindings for a model.
pub trait ProviderBinder: Send + Sync {
    /// Binds a fresh provider, with empty memory, to `model`.
    fn bind(&self, model: KnownModel) -> Result<Box<dyn CompletionProvider>>;
}

/// Options shared by every Groq binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroqOptions {
    /// System prompt placed at the head of every conversation.
    pub system_prompt: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Generated-token cap.
    pub max_tokens: Option<u32>,
}

/// A binding that streams completions from Groq.
pub struct GroqProvider {
    client: Groq,
    model: KnownModel,
    options: GroqOptions,
    memory: ConversationMemory,
}

impl GroqProvider {
    /// Binds `client` to `model` with empty memory.
    pub fn new(client: Groq, model: KnownModel, options: GroqOptions) -> Self {
        let memory = ConversationMemory::new(options.system_prompt.clone());
        Self {
            client,
            model,
            options,
            memory,
        }
    }

    fn params(&self, messages: Vec<Message>) -> ChatCompletionParams {
        ChatCompletionParams::new(self.model, messages)
            .with_temperature(self.options.temperature)
            .with_max_tokens(self.options.max_tokens)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for GroqProvider {
    fn model(&self) -> KnownModel {
        self.model
    }

    fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    async fn complete(&mut self, prompt: &str, renderer: &mut dyn Renderer) -> Result<Completion> {
        let params = self.params(self.memory.request_messages(prompt));
        let stream = self.client.stream(params).await?;
        futures::pin_mut!(stream);

        let mut content = String::new();
        let mut finish_reason = None;
        let mut usage = None;
        while let Some(event) = stream.next().await {
            match event? {
                ChatStreamEvent::Chunk(chunk) => {
                    if let Some(delta) = chunk.text_delta() {
                        renderer.print_text(delta);
                        content.push_str(delta);
                    }
                    if let Some(reason) = chunk.finish_reason() {
                        finish_reason = Some(reason);
                    }
                    if let Some(reported) = chunk.usage() {
                        usage = Some(reported);
                    }
                }
                ChatStreamEvent::Done => break,
            }
        }
        renderer.finish_response();

        if content.is_empty() && finish_reason.is_none() {
            return Err(Error::streaming(
                "stream ended before any completion arrived",
                None,
            ));
        }
        self.memory.record_turn(prompt, &content);
        Ok(Completion {
            content,
            finish_reason,
            usage,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<Completion> {
        let completion = self
            .client
            .send(self.params(vec![Message::user(prompt)]))
            .await?;
        Ok(Completion {
            content: completion.text().to_string(),
            finish_reason: completion.finish_reason(),
            usage: completion.usage,
        })
    }
}

/// Binds [`GroqProvider`]s that share one HTTP client and API key.
#[derive(Debug, Clone)]
pub struct GroqBinder {
    client: Groq,
    options: GroqOptions,
}

impl GroqBinder {
    /// Creates a binder around an existing client.
    pub fn new(client: Groq, options: GroqOptions) -> Self {
        Self { client, options }
    }

    /// Builds the client described by `config`.
    ///
    /// Fails with a configuration error when no API key is available.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let client = Groq::with_options(
            config.api_key.clone(),
            Some(config.base_url.clone()),
            Some(Duration::from_secs(config.timeout_secs)),
        )?;
        Ok(Self::new(
            client,
            GroqOptions {
                system_prompt: config.system_prompt.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        ))
    }
}

impl ProviderBinder for GroqBinder {
    fn bind(&self, model: KnownModel) -> Result<Box<dyn CompletionProvider>> {
        PROVIDER_BINDINGS.click();
        tracing::debug!(model = %model, "binding completion provider");
        Ok(Box::new(GroqProvider::new(
            self.client.clone(),
            model,
            self.options.clone(),
        )))
    }
}
