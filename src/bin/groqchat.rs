//! Interactive multi-session chat against the Groq API.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! GROQ_API_KEY=gsk_... groqchat
//!
//! # Start with a specific model
//! groqchat --model llama3-70b-8192
//!
//! # Disable colors (useful for piping output)
//! groqchat --no-color
//! ```
//!
//! Type a message to chat.  The first message of a new chat creates it and,
//! once answered, gives it a title.  Slash commands (`/help`) navigate
//! between chats, delete them and switch models.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use groqchat::chat::{
    ChatApp, ChatArgs, ChatCommand, ChatConfig, ChatEvent, PlainTextRenderer, Renderer,
    help_text, parse_command,
};
use groqchat::client::API_KEY_ENV;
use groqchat::{Error, GroqBinder, KnownModel};

fn main() {
    let (args, free) = ChatArgs::from_command_line_relaxed("groqchat [OPTIONS]");
    if !free.is_empty() {
        eprintln!("groqchat takes no positional arguments");
        std::process::exit(2);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ChatConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("groqchat: {err}");
            std::process::exit(2);
        }
    };
    let binder = match GroqBinder::from_config(&config) {
        Ok(binder) => binder,
        Err(err) => {
            eprintln!("groqchat: {err}");
            if err.is_configuration() {
                eprintln!("Set {API_KEY_ENV} or pass --api-key.");
            }
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("groqchat: could not start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(config, binder)) {
        eprintln!("groqchat: {err}");
        std::process::exit(1);
    }
}

async fn run(config: ChatConfig, binder: GroqBinder) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = ChatApp::new(config.model, Box::new(binder));
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!("Groq Chat (model: {})", config.model);
    println!("Type /help for commands, /quit to exit");
    renderer.render_view(&app.view());

    loop {
        let typed = match rl.readline("> ") {
            Ok(typed) => typed,
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        };
        let line = typed.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        let event = match parse_command(line) {
            None => ChatEvent::SubmitMessage(typed.clone()),
            Some(ChatCommand::Quit) => {
                println!("Goodbye!");
                break;
            }
            Some(ChatCommand::Help) => {
                for line in help_text().lines() {
                    println!("    {}", line);
                }
                continue;
            }
            Some(ChatCommand::Models) => {
                let current = app.registry().model();
                for model in KnownModel::ALL {
                    let marker = if model == current { "*" } else { " " };
                    println!("  {marker} {model}");
                }
                continue;
            }
            Some(ChatCommand::List) | Some(ChatCommand::History) => {
                renderer.render_view(&app.view());
                continue;
            }
            Some(ChatCommand::Invalid(message)) => {
                renderer.print_error(&message);
                continue;
            }
            Some(ChatCommand::New) => ChatEvent::NewSession,
            Some(ChatCommand::Model(model)) => ChatEvent::SwitchModel(model),
            Some(ChatCommand::Select(selector)) => match app.registry().resolve(&selector) {
                Ok(id) => ChatEvent::SelectSession(id),
                Err(err) => {
                    renderer.print_error(&err.to_string());
                    continue;
                }
            },
            Some(ChatCommand::Delete(selector)) => match app.registry().resolve(&selector) {
                Ok(id) => ChatEvent::DeleteSession(id),
                Err(err) => {
                    renderer.print_error(&err.to_string());
                    continue;
                }
            },
            Some(ChatCommand::Example(n)) => match app.example(n) {
                Ok(prompt) => {
                    println!("> {prompt}");
                    ChatEvent::SubmitMessage(prompt.to_string())
                }
                Err(err) => {
                    renderer.print_error(&err.to_string());
                    continue;
                }
            },
        };

        if matches!(event, ChatEvent::SubmitMessage(_)) {
            println!("Assistant:");
        }
        match app.dispatch(event, &mut renderer).await {
            Ok(()) => renderer.render_view(&app.view()),
            Err(err) => report(&mut renderer, &err),
        }
    }

    app.close();
    Ok(())
}

fn report(renderer: &mut dyn Renderer, err: &Error) {
    renderer.print_error(&err.to_string());
    if err.is_authentication() {
        renderer.print_info(&format!("Check that {API_KEY_ENV} holds a valid Groq API key."));
    } else if err.is_provider() {
        renderer.print_info("Your message was kept; send it again to retry.");
    }
}
