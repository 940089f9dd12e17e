//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::types::KnownModel;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// System prompt used unless `--system` overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly, talkative assistant. \
Answer with specific details from your knowledge, and when you do not know \
something, say so plainly instead of guessing.";

/// Command-line arguments for the groqchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemma-7b-it)", "MODEL")]
    pub model: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for every conversation", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: model limit)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature between 0 and 2", "TEMP")]
    pub temperature: Option<String>,

    /// API base URL.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// API key; falls back to GROQ_API_KEY.
    #[arrrg(optional, "API key (default: $GROQ_API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat application.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model selected at startup.
    pub model: KnownModel,

    /// Optional system prompt to set conversation context.
    pub system_prompt: Option<String>,

    /// Optional cap on generated tokens.
    pub max_tokens: Option<u32>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// API base URL.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Explicit API key; `None` means read the environment.
    pub api_key: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemma-7b-it
    /// - System prompt: [`DEFAULT_SYSTEM_PROMPT`]
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: KnownModel::default(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: None,
            temperature: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: KnownModel) -> Self {
        self.model = model;
        self
    }

    /// Sets or clears the system prompt.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let model = match args.model {
            Some(name) => name.parse::<KnownModel>().map_err(|err| {
                Error::validation(err.to_string(), Some("model".to_string()))
            })?,
            None => KnownModel::default(),
        };
        let temperature = args
            .temperature
            .map(|value| parse_temperature(&value))
            .transpose()?;
        if args.timeout_secs == Some(0) {
            return Err(Error::validation(
                "timeout must be at least one second",
                Some("timeout-secs".to_string()),
            ));
        }

        let defaults = ChatConfig::new();
        Ok(ChatConfig {
            model,
            system_prompt: args.system.or(defaults.system_prompt),
            max_tokens: args.max_tokens,
            temperature,
            base_url: args.base_url.unwrap_or(defaults.base_url),
            timeout_secs: args.timeout_secs.unwrap_or(defaults.timeout_secs),
            api_key: args.api_key,
            use_color: !args.no_color,
        })
    }
}

fn parse_temperature(value: &str) -> Result<f32> {
    let invalid = || {
        Error::validation(
            format!("temperature expects a value between 0 and 2, got {value}"),
            Some("temperature".to_string()),
        )
    };
    let parsed: f32 = value.trim().parse().map_err(|_| invalid())?;
    if parsed.is_finite() && (0.0..=2.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(invalid())
    }
}
