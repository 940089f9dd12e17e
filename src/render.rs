//! Output rendering for the chat REPL.
//!
//! This module provides the [`Renderer`] trait through which the chat reports
//! streamed text, errors and full-screen views, and a plain-text
//! implementation that writes to stdout with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::chat::View;
use crate::types::Role;

/// ANSI escape code for bold text (used for headings).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for secondary details).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for assistant labels).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for the active marker).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Print a chunk of response text.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines after streaming.
    fn finish_response(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Render the full state of the chat after an event.
    fn render_view(&mut self, view: &View<'_>);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            line_start: true,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn role_label(&self, role: Role) -> String {
        match role {
            Role::User => self.styled(ANSI_CYAN, "You:"),
            Role::Assistant => self.styled(ANSI_GREEN, "Assistant:"),
            Role::System => self.styled(ANSI_DIM, "System:"),
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        print!("{text}");
        self.line_start = text.ends_with('\n');
        self.flush();
    }

    fn finish_response(&mut self) {
        if !self.line_start {
            println!();
            self.line_start = true;
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.finish_response();
        eprintln!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_info(&mut self, info: &str) {
        self.finish_response();
        println!("{info}");
        self.flush();
    }

    fn render_view(&mut self, view: &View<'_>) {
        self.finish_response();
        println!();
        println!(
            "{} {}",
            self.styled(ANSI_BOLD, "Model:"),
            view.model
        );

        if view.sessions.is_empty() {
            println!("{}", self.styled(ANSI_DIM, "No chats yet."));
        } else {
            println!("{}", self.styled(ANSI_BOLD, "Chats:"));
            for entry in &view.sessions {
                let marker = if entry.active {
                    self.styled(ANSI_YELLOW, "*")
                } else {
                    " ".to_string()
                };
                let detail = self.styled(
                    ANSI_DIM,
                    &format!("({}, {} messages)", entry.id.short(), entry.message_count),
                );
                println!("  {marker} {:>2}. {} {detail}", entry.position, entry.title);
            }
        }
        println!();

        if view.new_session {
            println!("{}", self.styled(ANSI_BOLD, "Try these examples:"));
            for (index, prompt) in view.examples.iter().enumerate() {
                println!("  /example {}  {prompt}", index + 1);
            }
            println!();
        }

        for message in view.transcript {
            println!("{} {}", self.role_label(message.role), message.content);
        }
        self.line_start = true;
        self.flush();
    }
}
