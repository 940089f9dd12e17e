//! Snapshot of chat state handed to a renderer after every event.

use crate::chat::registry::{SessionId, SessionRegistry};
use crate::types::{KnownModel, Message};

/// One line of the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry<'a> {
    /// 1-based position, usable as a selector.
    pub position: usize,
    /// The session identifier.
    pub id: SessionId,
    /// The session title.
    pub title: &'a str,
    /// Number of messages in the transcript.
    pub message_count: usize,
    /// True for the session on screen.
    pub active: bool,
}

/// Everything the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View<'a> {
    /// The selected model.
    pub model: KnownModel,
    /// True while the next message starts a new chat.
    pub new_session: bool,
    /// Every chat, in creation order.
    pub sessions: Vec<SessionEntry<'a>>,
    /// The active chat's messages; empty in new-session mode.
    pub transcript: &'a [Message],
    /// Example prompts offered in new-session mode.
    pub examples: &'a [&'static str],
}

impl<'a> View<'a> {
    pub(crate) fn new(registry: &'a SessionRegistry, examples: &'a [&'static str]) -> Self {
        let active = registry.active();
        let sessions = registry
            .iter()
            .enumerate()
            .map(|(index, session)| SessionEntry {
                position: index + 1,
                id: session.id(),
                title: session.title(),
                message_count: session.message_count(),
                active: Some(session.id()) == active,
            })
            .collect();
        let transcript = registry
            .active_session()
            .map(|session| session.messages())
            .unwrap_or(&[]);
        let new_session = registry.is_new_session();
        Self {
            model: registry.model(),
            new_session,
            sessions,
            transcript,
            examples: if new_session { examples } else { &[] },
        }
    }

    /// The title of the active chat, if any.
    pub fn active_title(&self) -> Option<&'a str> {
        self.sessions.iter().find(|e| e.active).map(|e| e.title)
    }
}
