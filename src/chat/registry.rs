//! In-memory registry of chat sessions.
//!
//! The registry owns every [`ChatSession`] of the running process together
//! with the [`ActiveState`]: which session is on screen, whether the user is
//! composing a brand-new chat, and which model is selected.  Nothing here is
//! persisted; dropping the registry discards every conversation.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{KnownModel, Message, Role};

/// Title shown for a session until one is generated from its first exchange.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Opaque unique identifier of a chat session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The first eight hex digits, enough to tell sessions apart on screen.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| Error::validation(format!("not a session id: {s}"), None))
    }
}

/// One independent chat thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    id: SessionId,
    title: String,
    model: KnownModel,
    messages: Vec<Message>,
    titled: bool,
}

impl ChatSession {
    fn new(id: SessionId, model: KnownModel) -> Self {
        Self {
            id,
            title: PLACEHOLDER_TITLE.to_string(),
            model,
            messages: Vec::new(),
            titled: false,
        }
    }

    /// The session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The current title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The model selected when the session was created.
    pub fn model(&self) -> KnownModel {
        self.model
    }

    /// Messages in conversation order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// True once title generation has run for this session.
    pub fn is_titled(&self) -> bool {
        self.titled
    }

    /// Renders the transcript as `role: content` lines.
    pub fn transcript_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Which session is on screen and which model new turns use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveState {
    /// The displayed session; `None` while composing a new chat.
    pub active: Option<SessionId>,
    /// True while the next submitted message starts a new session.
    pub new_session: bool,
    /// The model used for the next binding.
    pub model: KnownModel,
}

impl ActiveState {
    fn new(model: KnownModel) -> Self {
        Self {
            active: None,
            new_session: true,
            model,
        }
    }
}

/// Insertion-ordered collection of chat sessions plus the active state.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Vec<ChatSession>,
    state: ActiveState,
}

impl SessionRegistry {
    /// Creates an empty registry in new-session mode.
    pub fn new(model: KnownModel) -> Self {
        Self {
            sessions: Vec::new(),
            state: ActiveState::new(model),
        }
    }

    /// Allocates a new session with the placeholder title and inserts it.
    ///
    /// The active state is left untouched; callers select the session once
    /// its first message is committed.
    pub fn create(&mut self, model: KnownModel) -> SessionId {
        let id = SessionId::generate();
        self.sessions.push(ChatSession::new(id, model));
        id
    }

    /// Appends a message to the end of a session's transcript.
    pub fn append_message(
        &mut self,
        id: SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Result<()> {
        let session = self.get_mut(id)?;
        session.messages.push(Message::new(role, content));
        Ok(())
    }

    /// Replaces a session's title.
    pub fn retitle(&mut self, id: SessionId, title: impl Into<String>) -> Result<()> {
        let session = self.get_mut(id)?;
        session.title = title.into();
        Ok(())
    }

    /// Records that title generation has run for a session.
    pub fn mark_titled(&mut self, id: SessionId) -> Result<()> {
        self.get_mut(id)?.titled = true;
        Ok(())
    }

    /// Removes a session.
    ///
    /// When the removed session was active, the first remaining session
    /// becomes active, or the registry returns to new-session mode if it is
    /// now empty.  Deleting any other session leaves the active state alone.
    pub fn delete(&mut self, id: SessionId) -> Result<ChatSession> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::session_not_found(id))?;
        let removed = self.sessions.remove(index);
        if self.state.active == Some(id) {
            match self.sessions.first() {
                Some(next) => {
                    self.state.active = Some(next.id);
                    self.state.new_session = false;
                }
                None => {
                    self.state.active = None;
                    self.state.new_session = true;
                }
            }
        }
        Ok(removed)
    }

    /// Makes a session active and leaves new-session mode.
    pub fn select(&mut self, id: SessionId) -> Result<()> {
        if self.position(id).is_none() {
            return Err(Error::session_not_found(id));
        }
        self.state.active = Some(id);
        self.state.new_session = false;
        Ok(())
    }

    /// Enters new-session mode without creating anything.
    pub fn start_new(&mut self) {
        self.state.active = None;
        self.state.new_session = true;
    }

    /// Looks up a session.
    pub fn get(&self, id: SessionId) -> Result<&ChatSession> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::session_not_found(id))
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut ChatSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::session_not_found(id))
    }

    fn position(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// True if a session with this id exists.
    pub fn contains(&self, id: SessionId) -> bool {
        self.position(id).is_some()
    }

    /// Sessions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.iter()
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// A copy of the active state.
    pub fn state(&self) -> ActiveState {
        self.state
    }

    /// The active session id, if any.
    pub fn active(&self) -> Option<SessionId> {
        self.state.active
    }

    /// The active session, if any.
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.state.active.and_then(|id| self.get(id).ok())
    }

    /// True while the next message starts a new session.
    pub fn is_new_session(&self) -> bool {
        self.state.new_session
    }

    /// The selected model.
    pub fn model(&self) -> KnownModel {
        self.state.model
    }

    /// Changes the selected model.
    pub fn set_model(&mut self, model: KnownModel) {
        self.state.model = model;
    }

    /// Resolves a user-supplied selector to a session id.
    ///
    /// A selector is either a 1-based position in the listing (fewer than
    /// eight digits), a full session id, or an unambiguous prefix of one.
    pub fn resolve(&self, selector: &str) -> Result<SessionId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(Error::validation("empty chat selector", None));
        }
        if selector.len() < 8
            && let Ok(index) = selector.parse::<usize>()
        {
            return index
                .checked_sub(1)
                .and_then(|i| self.sessions.get(i))
                .map(|s| s.id)
                .ok_or_else(|| {
                    Error::no_matching_session(format!("no chat at position {index}"))
                });
        }
        let wanted = selector.to_ascii_lowercase().replace('-', "");
        let mut matches = self
            .sessions
            .iter()
            .filter(|s| s.id.0.simple().to_string().starts_with(&wanted));
        match (matches.next(), matches.next()) {
            (Some(session), None) => Ok(session.id),
            (Some(_), Some(_)) => Err(Error::validation(
                format!("ambiguous chat selector: {selector}"),
                None,
            )),
            (None, _) => Err(Error::no_matching_session(format!(
                "no chat matches {selector}"
            ))),
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(KnownModel::default())
    }
}
