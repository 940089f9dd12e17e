use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of Groq-hosted models a chat can be bound to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Google Gemma 7B instruction tuned.
    #[default]
    #[serde(rename = "gemma-7b-it")]
    Gemma7bIt,

    /// Meta Llama 3 70B with an 8k context window.
    #[serde(rename = "llama3-70b-8192")]
    Llama3_70b8192,

    /// Meta Llama 3 8B with an 8k context window.
    #[serde(rename = "llama3-8b-8192")]
    Llama3_8b8192,

    /// Mistral Mixtral 8x7B with a 32k context window.
    #[serde(rename = "mixtral-8x7b-32768")]
    Mixtral8x7b32768,

    /// OpenAI Whisper large v3.
    #[serde(rename = "whisper-large-v3")]
    WhisperLargeV3,
}

impl KnownModel {
    /// Every selectable model, in menu order.
    pub const ALL: [KnownModel; 5] = [
        KnownModel::Gemma7bIt,
        KnownModel::Llama3_70b8192,
        KnownModel::Llama3_8b8192,
        KnownModel::Mixtral8x7b32768,
        KnownModel::WhisperLargeV3,
    ];

    /// The identifier the API expects in the `model` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gemma7bIt => "gemma-7b-it",
            KnownModel::Llama3_70b8192 => "llama3-70b-8192",
            KnownModel::Llama3_8b8192 => "llama3-8b-8192",
            KnownModel::Mixtral8x7b32768 => "mixtral-8x7b-32768",
            KnownModel::WhisperLargeV3 => "whisper-large-v3",
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string names no known model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelParseError {
    /// The string that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for ModelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown model: {}", self.invalid_value)
    }
}

impl std::error::Error for ModelParseError {}

impl FromStr for KnownModel {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        KnownModel::ALL
            .iter()
            .copied()
            .find(|model| model.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ModelParseError {
                invalid_value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_gemma() {
        assert_eq!(KnownModel::default(), KnownModel::Gemma7bIt);
    }

    #[test]
    fn serialization_uses_api_names() {
        let json = serde_json::to_string(&KnownModel::Llama3_70b8192).unwrap();
        assert_eq!(json, r#""llama3-70b-8192""#);

        let model: KnownModel = serde_json::from_str(r#""mixtral-8x7b-32768""#).unwrap();
        assert_eq!(model, KnownModel::Mixtral8x7b32768);
    }

    #[test]
    fn parse_round_trips_display() {
        for model in KnownModel::ALL {
            assert_eq!(model.to_string().parse::<KnownModel>(), Ok(model));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(
            "  LLAMA3-8B-8192 ".parse::<KnownModel>(),
            Ok(KnownModel::Llama3_8b8192)
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "gpt-4o".parse::<KnownModel>().unwrap_err();
        assert_eq!(err.invalid_value, "gpt-4o");
        assert_eq!(err.to_string(), "Unknown model: gpt-4o");
    }
}
