//! Multi-session chat application.
//!
//! This module holds everything above the HTTP client: the in-memory
//! registry of chat sessions, turn execution with title generation, model
//! switching, slash commands for the REPL, and the configuration the binary
//! is started with.
//!
//! # Architecture
//!
//! - [`registry`]: sessions, transcripts and the active state
//! - [`app`]: the [`ChatApp`] state object and [`ChatEvent`] dispatch
//! - [`view`]: the snapshot handed to a [`Renderer`] after each event
//! - [`commands`]: slash command parsing
//! - [`config`]: CLI argument parsing and configuration

pub mod app;
pub mod commands;
pub mod config;
pub mod registry;
pub mod view;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use app::{ChatApp, ChatEvent, EXAMPLE_PROMPTS, EXAMPLES_SHOWN};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_BASE_URL, DEFAULT_SYSTEM_PROMPT};
pub use registry::{ActiveState, ChatSession, PLACEHOLDER_TITLE, SessionId, SessionRegistry};
pub use view::{SessionEntry, View};
