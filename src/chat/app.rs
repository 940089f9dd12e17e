//! The chat application state object and its event dispatch.
//!
//! [`ChatApp`] owns the [`SessionRegistry`] and one provider binding per
//! session.  The REPL translates user input into [`ChatEvent`]s, hands each
//! one to [`ChatApp::dispatch`], and renders [`ChatApp::view`] afterwards.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

use rand::seq::SliceRandom;

use crate::chat::registry::{SessionId, SessionRegistry};
use crate::chat::view::View;
use crate::error::{Error, Result};
use crate::observability::{
    MODEL_SWITCHES, SESSIONS_CREATED, SESSIONS_DELETED, TITLES_GENERATED, TURN_DURATION,
    TURN_FAILURES, TURNS,
};
use crate::provider::{Completion, CompletionProvider, ProviderBinder};
use crate::render::Renderer;
use crate::types::{KnownModel, Role};

/// Prompts offered to the user when starting a new chat.
pub const EXAMPLE_PROMPTS: [&str; 10] = [
    "Explain quantum computing in simple terms.",
    "What are the main causes of climate change?",
    "How does machine learning work?",
    "What are the benefits of meditation?",
    "Describe the process of photosynthesis.",
    "What are the key events of World War II?",
    "How does the human immune system function?",
    "Explain the theory of relativity.",
    "What are the major art movements in history?",
    "How do cryptocurrencies work?",
];

/// How many example prompts are shown at once.
pub const EXAMPLES_SHOWN: usize = 4;

/// Something the user asked the application to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Show an existing session.
    SelectSession(SessionId),
    /// Remove a session and its binding.
    DeleteSession(SessionId),
    /// Change the model used for subsequent turns.
    SwitchModel(KnownModel),
    /// Send a user message.
    SubmitMessage(String),
    /// Return to composing a new chat.
    NewSession,
}

/// The whole state of a running chat.
pub struct ChatApp {
    registry: SessionRegistry,
    binder: Box<dyn ProviderBinder>,
    bindings: HashMap<SessionId, Box<dyn CompletionProvider>>,
    examples: Vec<&'static str>,
}

impl ChatApp {
    /// Creates an application with no sessions, in new-session mode.
    pub fn new(model: KnownModel, binder: Box<dyn ProviderBinder>) -> Self {
        Self {
            registry: SessionRegistry::new(model),
            binder,
            bindings: HashMap::new(),
            examples: sample_examples(),
        }
    }

    /// Read access to the sessions and active state.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The example prompts currently on offer.
    pub fn examples(&self) -> &[&'static str] {
        &self.examples
    }

    /// The n-th (1-based) example prompt currently on offer.
    pub fn example(&self, n: usize) -> Result<&'static str> {
        n.checked_sub(1)
            .and_then(|index| self.examples.get(index))
            .copied()
            .ok_or_else(|| {
                Error::validation(
                    format!("choose an example between 1 and {}", self.examples.len()),
                    Some("example".to_string()),
                )
            })
    }

    /// A snapshot of everything the presentation layer shows.
    pub fn view(&self) -> View<'_> {
        View::new(&self.registry, &self.examples)
    }

    /// Runs one event to completion.
    pub async fn dispatch(&mut self, event: ChatEvent, renderer: &mut dyn Renderer) -> Result<()> {
        tracing::debug!(?event, "dispatching chat event");
        match event {
            ChatEvent::SelectSession(id) => self.select(id),
            ChatEvent::DeleteSession(id) => self.delete(id),
            ChatEvent::SwitchModel(model) => {
                self.switch_model(model);
                Ok(())
            }
            ChatEvent::SubmitMessage(text) => self.submit(&text, renderer).await.map(|_| ()),
            ChatEvent::NewSession => {
                self.new_session();
                Ok(())
            }
        }
    }

    /// Makes `id` the active session.
    pub fn select(&mut self, id: SessionId) -> Result<()> {
        self.registry.select(id)
    }

    /// Deletes a session and the provider context bound to it.
    pub fn delete(&mut self, id: SessionId) -> Result<()> {
        self.registry.delete(id)?;
        self.bindings.remove(&id);
        SESSIONS_DELETED.click();
        tracing::info!(session = %id, "deleted chat");
        if self.registry.is_new_session() {
            self.examples = sample_examples();
        }
        Ok(())
    }

    /// Enters new-session mode; the session itself is created on submit.
    pub fn new_session(&mut self) {
        self.registry.start_new();
        self.examples = sample_examples();
    }

    /// Selects `model` for every later turn.
    ///
    /// Changing the model discards all provider bindings, so the next reply in
    /// any session starts without provider-side context.  Transcripts are kept.
    pub fn switch_model(&mut self, model: KnownModel) {
        if model == self.registry.model() {
            return;
        }
        tracing::info!(from = %self.registry.model(), to = %model, "switching model");
        MODEL_SWITCHES.click();
        self.registry.set_model(model);
        self.bindings.clear();
    }

    /// Sends `text` in the active session, creating one first if needed.
    ///
    /// The user message is committed before the provider is called.  When
    /// the provider fails, the message stays in the transcript without a
    /// reply and the error is returned.  A failed title request is returned
    /// too, after the reply is committed; the title is never requested again.
    pub async fn submit(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<Completion> {
        if text.trim().is_empty() {
            return Err(Error::validation("message is empty", None));
        }

        let id = match self.registry.active() {
            Some(id) if !self.registry.is_new_session() => id,
            _ => {
                let id = self.registry.create(self.registry.model());
                self.registry.select(id)?;
                self.bindings.remove(&id);
                SESSIONS_CREATED.click();
                tracing::info!(session = %id, "created chat");
                id
            }
        };
        self.registry.append_message(id, Role::User, text)?;

        let provider = match self.bindings.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.binder.bind(self.registry.model())?),
        };

        let start = Instant::now();
        TURNS.click();
        let completion = match provider.complete(text, renderer).await {
            Ok(completion) => completion,
            Err(err) => {
                TURN_FAILURES.click();
                tracing::warn!(session = %id, error = %err, "turn failed");
                return Err(err);
            }
        };
        TURN_DURATION.add(start.elapsed().as_secs_f64());
        tracing::debug!(
            session = %id,
            finish_reason = ?completion.finish_reason,
            usage = ?completion.usage,
            "turn complete"
        );
        self.registry
            .append_message(id, Role::Assistant, completion.content.clone())?;

        let session = self.registry.get(id)?;
        if session.message_count() == 2 && !session.is_titled() {
            let prompt = title_prompt(&session.transcript_text());
            let generated = provider.generate(&prompt).await;
            self.registry.mark_titled(id)?;
            match generated {
                Ok(title) => {
                    let title = title.content.trim();
                    TITLES_GENERATED.click();
                    tracing::debug!(session = %id, title = %title, "titled chat");
                    self.registry.retitle(id, title)?;
                }
                Err(err) => {
                    tracing::warn!(session = %id, error = %err, "title generation failed");
                    return Err(err);
                }
            }
        }

        Ok(completion)
    }

    /// Shuts the application down, discarding every session.
    pub fn close(self) {
        tracing::info!(
            sessions = self.registry.len(),
            bindings = self.bindings.len(),
            "closing chat"
        );
    }
}

fn sample_examples() -> Vec<&'static str> {
    EXAMPLE_PROMPTS
        .choose_multiple(&mut rand::thread_rng(), EXAMPLES_SHOWN)
        .copied()
        .collect()
}

fn title_prompt(transcript: &str) -> String {
    format!(
        "Based on the following conversation, generate a short, concise title \
(max 6 words):\n\n{transcript}\n\nTitle:"
    )
}
