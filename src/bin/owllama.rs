//! Command-line client for a local Ollama server.
//!
//! # Usage
//!
//! ```bash
//! # List installed models
//! owllama list
//!
//! # One-shot completion
//! owllama generate llama3 "Why is the sky blue?"
//!
//! # Interactive chat; reasoning blocks of qwen3 models are hidden
//! owllama chat qwen3 --no-spinner
//!
//! # Review earlier chats
//! owllama history list
//! owllama history view 1a2b3c4d
//!
//! # Anything else goes to the ollama executable
//! owllama pull llama3
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Reset the conversation context
//! - `/edit`, `/vi` - Compose the next message in `$EDITOR`
//! - `/search <query>` - Add a Wikipedia summary to the context
//! - `/exit`, `/quit` - Save the chat to history and exit

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use arrrg::CommandLine;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use owllama::chat::{
    ChatArgs, ChatConfig, ChatSession, Flow, HistoryStore, PlainTextRenderer, RandomKeyGenerator,
    Renderer, Wikipedia, build_guided_prompt, view_line,
};
use owllama::cli::{Command, is_builtin, usage_text};
use owllama::forward::{MISSING_EXECUTABLE, forward_to_ollama};
use owllama::{GenerateRequest, JsonLinesLogger, Ollama};

/// Main entry point for the owllama application.
#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if let Some(first) = raw.first() {
        if !is_builtin(first) {
            return forward(&raw);
        }
    }

    let (args, free) = ChatArgs::from_command_line_relaxed("owllama <command> [args] [OPTIONS]");
    let command = match Command::parse(&free) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            println!("{}", usage_text());
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Help => {
            println!("{}", usage_text());
            Ok(())
        }
        Command::List => list(args).await,
        Command::Version => version(args).await,
        Command::Generate { model, prompt } => generate(args, model, prompt).await,
        Command::HistoryList => {
            history_list(args);
            Ok(())
        }
        Command::HistoryView { key } => {
            history_view(args, &key);
            Ok(())
        }
        Command::Chat { model } => chat(args, model).await,
        Command::Forward(raw) => return forward(&raw),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;

fn client_for(config: &ChatConfig) -> owllama::Result<Ollama> {
    Ollama::with_options(config.host.clone(), config.timeout)
}

fn forward(raw: &[String]) -> ExitCode {
    match forward_to_ollama(raw) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) if err.is_not_found() => {
            eprintln!("{MISSING_EXECUTABLE}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn list(args: ChatArgs) -> BoxResult<()> {
    let client = client_for(&ChatConfig::from(args))?;
    let models = client
        .list_models()
        .await
        .map_err(|err| format!("listing models: {err}"))?;
    for model in models.models {
        println!("{}", model.name);
    }
    Ok(())
}

async fn version(args: ChatArgs) -> BoxResult<()> {
    let client = client_for(&ChatConfig::from(args))?;
    let version = client
        .version()
        .await
        .map_err(|err| format!("getting version: {err}"))?;
    println!("{}", version.version);
    Ok(())
}

async fn generate(args: ChatArgs, model: String, prompt: String) -> BoxResult<()> {
    let client = client_for(&ChatConfig::from(args))?;
    let stream = client
        .generate(GenerateRequest::new(model, prompt))
        .await
        .map_err(|err| format!("generating response: {err}"))?;
    let mut stream = std::pin::pin!(stream);
    let mut stdout = io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| format!("generating response: {err}"))?;
        if let Some(error) = chunk.error {
            return Err(format!("generating response: {error}").into());
        }
        write!(stdout, "{}", chunk.response)?;
        stdout.flush()?;
        if chunk.done {
            writeln!(stdout)?;
            break;
        }
    }
    Ok(())
}

fn history_list(args: ChatArgs) {
    let config = ChatConfig::from(args);
    let history = HistoryStore::new(config.history_path).load();
    for summary in history.summaries() {
        println!("{}: {}", summary.session_key, summary.preview);
    }
}

fn history_view(args: ChatArgs, key: &str) {
    let config = ChatConfig::from(args);
    let history = HistoryStore::new(config.history_path).load();
    match history.view(key) {
        Ok(messages) => {
            for message in messages {
                println!("{}", view_line(message));
            }
        }
        Err(_) => println!("Session not found."),
    }
}

fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Option<String> {
    rl.readline(prompt).ok()
}

async fn chat(args: ChatArgs, model: String) -> BoxResult<()> {
    let config = ChatConfig::from(args).with_model(model);
    let mut client = client_for(&config)?;
    if let Some(path) = &config.log_path {
        client = client.with_logger(Arc::new(JsonLinesLogger::open(path)?));
    }

    let store = HistoryStore::new(config.history_path.clone());
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let guided = config.guided;
    let mut session = ChatSession::start(client, config, store, &mut RandomKeyGenerator)
        .with_knowledge_source(Box::new(Wikipedia::new()?));
    let mut rl = DefaultEditor::new()?;

    println!(
        "Chatting with {} (session {})",
        session.model(),
        session.session_key()
    );

    if guided {
        if let Some(prompt) = build_guided_prompt(&mut renderer, |p| read_line(&mut rl, p)) {
            session.handle_input(&prompt, &mut renderer).await;
        }
    }

    println!("\nType /exit to quit. Type /clear to reset context.");

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                if session.handle_input(&line, &mut renderer).await == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt abandons the line only.
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nExiting chat session.");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Error reading input: {err}"));
                break;
            }
        }
    }

    match session.finish() {
        Ok(true) => renderer.print_info(&format!(
            "Chat saved as session {}.",
            session.session_key()
        )),
        Ok(false) => {}
        Err(err) => renderer.print_error(&format!("Failed to save chat history: {err}")),
    }
    Ok(())
}
