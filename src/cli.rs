//! Top-level command parsing.
//!
//! The first positional argument selects a command.  Words owllama does not
//! know are handed to the `ollama` executable untouched.

use std::fmt;

use crate::chat::DEFAULT_MODEL;

/// A top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the models available on the server.
    List,
    /// Stream a single completion.
    Generate {
        /// Model to generate with.
        model: String,
        /// The prompt.
        prompt: String,
    },
    /// Print the server version.
    Version,
    /// Print usage.
    Help,
    /// Start an interactive session.
    Chat {
        /// Model to chat with.
        model: String,
    },
    /// Print one line per saved session.
    HistoryList,
    /// Print the messages of one saved session.
    HistoryView {
        /// The session key.
        key: String,
    },
    /// Run `ollama` with these arguments.
    Forward(Vec<String>),
}

/// A known command was given without its required arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    message: String,
}

impl UsageError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// What was missing.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UsageError {}

/// Returns true if `word` names a command owllama handles itself.
pub fn is_builtin(word: &str) -> bool {
    matches!(
        word,
        "list" | "generate" | "version" | "help" | "chat" | "history"
    )
}

impl Command {
    /// Parses positional arguments (program name excluded).
    ///
    /// Extra trailing arguments are ignored.
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        let Some(first) = args.first() else {
            return Err(UsageError::new("missing command"));
        };
        let rest = &args[1..];

        match first.as_str() {
            "list" => Ok(Command::List),
            "version" => Ok(Command::Version),
            "help" => Ok(Command::Help),
            "generate" => match rest {
                [model, prompt, ..] => Ok(Command::Generate {
                    model: model.clone(),
                    prompt: prompt.clone(),
                }),
                _ => Err(UsageError::new("generate requires a model and a prompt")),
            },
            "chat" => Ok(Command::Chat {
                model: rest
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            }),
            "history" => match rest {
                [sub, ..] if sub == "list" => Ok(Command::HistoryList),
                [sub, key, ..] if sub == "view" => Ok(Command::HistoryView { key: key.clone() }),
                [sub] if sub == "view" => Err(UsageError::new("history view requires a session key")),
                _ => Err(UsageError::new("history requires 'list' or 'view <key>'")),
            },
            _ => Ok(Command::Forward(args.to_vec())),
        }
    }
}

/// Returns the usage text.
pub fn usage_text() -> &'static str {
    r#"Usage: owllama <command> [args] [options]

Commands:
  list                        List available models
  generate <model> <prompt>   Generate a completion
  version                     Show the server version
  chat [model]                Start an interactive chat (default model: gemma3)
  history list                List saved chat sessions
  history view <key>          Show the messages of a saved session
  help                        Show this message

Any other command is passed to the ollama executable.

Chat options:
  --host HOST                 Ollama host (default: $OLLAMA_HOST or localhost:11434)
  --history-file PATH         History file (default: owllama_chat_history.json)
  --timeout-secs SECONDS      Request timeout
  --log-file PATH             Log chat requests and responses as JSON lines
  --reasoning-marker MARKER   Models whose names contain MARKER get think filtering
  --think-start TEXT          Reasoning block start marker (default: <think>)
  --think-end TEXT            Reasoning block end marker (default: </think>)
  --guided                    Build the first prompt step by step
  --no-color                  Disable ANSI colors/styles
  --no-spinner                Disable the progress spinner"#
}
