//! Error types for groqchat.
//!
//! Three families matter to callers: configuration errors (fatal at startup),
//! provider errors (anything that went wrong talking to Groq), and lookups of
//! chat sessions that the registry does not hold.  [`Error::is_provider`]
//! draws the line the REPL uses to decide whether a turn may be retried.

use std::error;
use std::fmt;
use std::str::Utf8Error;
use std::sync::Arc;

type Source = Arc<dyn error::Error + Send + Sync>;

/// The main error type for groqchat.
#[derive(Clone, Debug)]
pub enum Error {
    /// Missing or unusable configuration, such as an absent API key or a
    /// malformed base URL.
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Input the application refused before doing any work.
    Validation {
        /// Human-readable error message.
        message: String,
        /// The flag or argument at fault, when there is one.
        param: Option<String>,
    },

    /// No chat session matches the given id or selector.
    SessionNotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Groq rejected the API key (HTTP 401 or 403).
    Authentication {
        /// Message returned by Groq.
        message: String,
    },

    /// Groq asked us to slow down (HTTP 429).
    RateLimit {
        /// Message returned by Groq.
        message: String,
        /// Seconds to wait, from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// The request or the model took too long.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// The limit that was exceeded, in seconds.
        duration: Option<f64>,
    },

    /// Groq is overloaded or a gateway in front of it failed (HTTP 502-504).
    ServiceUnavailable {
        /// Message returned by Groq.
        message: String,
        /// Seconds to wait, from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// Any other failure reported by Groq, over HTTP or inside a stream.
    Api {
        /// HTTP status, or 500 for errors carried in an event stream.
        status: u16,
        /// The `error.type` field of the response body.
        error_type: Option<String>,
        /// Message returned by Groq.
        message: String,
    },

    /// The request never got an HTTP answer.
    Transport {
        /// Human-readable error message.
        message: String,
        /// The underlying client error.
        source: Option<Source>,
    },

    /// The response body broke off while streaming.
    Streaming {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Source>,
    },

    /// The stream carried bytes that are not UTF-8.
    Encoding {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Source>,
    },

    /// A response or event did not have the expected JSON shape.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Source>,
    },
}

fn shared(source: Option<Box<dyn error::Error + Send + Sync>>) -> Option<Source> {
    source.map(Arc::from)
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// No session with exactly this id.
    pub fn session_not_found(id: impl fmt::Display) -> Self {
        Error::SessionNotFound {
            message: format!("no chat with id {id}"),
        }
    }

    /// A selector that matched no session.
    pub fn no_matching_session(message: impl Into<String>) -> Self {
        Error::SessionNotFound {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    pub fn api(status: u16, error_type: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            error_type,
            message: message.into(),
        }
    }

    pub fn transport(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn encoding(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Encoding {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: shared(source),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// True only for session lookups; a 404 from Groq is an [`Error::Api`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SessionNotFound { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Whether this error came from talking to Groq.
    ///
    /// After a provider error the user message stays in the transcript and
    /// the user may send it again.  The remaining errors are raised locally
    /// before any request is made.
    pub fn is_provider(&self) -> bool {
        !matches!(
            self,
            Error::Configuration { .. } | Error::Validation { .. } | Error::SessionNotFound { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => write!(f, "Configuration error: {message}"),
            Error::Validation { message, param } => match param {
                Some(param) => write!(f, "Invalid {param}: {message}"),
                None => write!(f, "Invalid input: {message}"),
            },
            Error::SessionNotFound { message } => write!(f, "Chat not found: {message}"),
            Error::Authentication { message } => write!(f, "Authentication error: {message}"),
            Error::RateLimit {
                message,
                retry_after,
            } => {
                write!(f, "Rate limited by Groq: {message}")?;
                if let Some(seconds) = retry_after {
                    write!(f, " (retry in {seconds}s)")?;
                }
                Ok(())
            }
            Error::Timeout { message, duration } => {
                write!(f, "Timed out: {message}")?;
                if let Some(seconds) = duration {
                    write!(f, " after {seconds:.1}s")?;
                }
                Ok(())
            }
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                write!(f, "Groq is unavailable: {message}")?;
                if let Some(seconds) = retry_after {
                    write!(f, " (retry in {seconds}s)")?;
                }
                Ok(())
            }
            Error::Api {
                status,
                error_type,
                message,
            } => match error_type {
                Some(error_type) => write!(f, "{error_type}: {message}"),
                None => write!(f, "Groq returned HTTP {status}: {message}"),
            },
            Error::Transport { message, .. } => write!(f, "Could not reach Groq: {message}"),
            Error::Streaming { message, .. } => write!(f, "Stream interrupted: {message}"),
            Error::Encoding { message, .. } => write!(f, "Encoding error: {message}"),
            Error::Serialization { message, .. } => write!(f, "Unexpected response: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport { source, .. }
            | Error::Streaming { source, .. }
            | Error::Encoding { source, .. }
            | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::configuration(format!("bad base URL: {err}"))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::encoding(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for groqchat operations.
pub type Result<T> = std::result::Result<T, Error>;
