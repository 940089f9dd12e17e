//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the chat (navigation, model selection,
//! deletion) and is never sent to the API.  Everything else is a message.

use crate::types::KnownModel;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start composing a new chat.
    New,

    /// Show the chat list and the active transcript.
    List,

    /// Make a chat active, by position or id prefix.
    Select(String),

    /// Delete a chat, by position or id prefix.
    Delete(String),

    /// Switch the selected model.
    Model(KnownModel),

    /// List the selectable models.
    Models,

    /// Submit the n-th displayed example prompt (1-based).
    Example(usize),

    /// Show the active transcript again.
    History,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use groqchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model llama3-8b-8192").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let body = input.strip_prefix('/')?;

    let mut parts = body.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "list" | "chats" | "ls" => ChatCommand::List,
        "select" | "open" => match argument {
            Some(selector) => ChatCommand::Select(selector.to_string()),
            None => ChatCommand::Invalid("/select requires a chat number or id".to_string()),
        },
        "delete" | "rm" => match argument {
            Some(selector) => ChatCommand::Delete(selector.to_string()),
            None => ChatCommand::Invalid("/delete requires a chat number or id".to_string()),
        },
        "model" => match argument {
            Some(name) => match name.parse::<KnownModel>() {
                Ok(model) => ChatCommand::Model(model),
                Err(err) => ChatCommand::Invalid(format!("{err} (see /models)")),
            },
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "models" => ChatCommand::Models,
        "example" => match argument.map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => ChatCommand::Example(n),
            Some(_) => ChatCommand::Invalid("/example expects a positive number".to_string()),
            None => ChatCommand::Invalid("/example requires a number".to_string()),
        },
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat (created when you send a message)
  /list                  Show chats and the current conversation
  /select <n|id>         Switch to a chat by number or id prefix
  /delete <n|id>         Delete a chat by number or id prefix
  /model <name>          Switch model (resets the assistant's memory)
  /models                List available models
  /example <n>           Send one of the suggested example prompts
  /history               Show the current conversation again
  /help                  Show this help message
  /quit                  Exit the chat"#
}
