//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::editor::default_editor;
use crate::chat::history::DEFAULT_HISTORY_FILE;
use crate::chat::think::{
    DEFAULT_REASONING_MARKER, DEFAULT_THINK_END, DEFAULT_THINK_START, ThinkFilter,
};

/// Model used when `chat` is given none.
pub const DEFAULT_MODEL: &str = "gemma3";

/// Command-line options for the owllama tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Ollama server address.
    #[arrrg(optional, "Ollama host (default: $OLLAMA_HOST or localhost:11434)", "HOST")]
    pub host: Option<String>,

    /// Where chat history is kept.
    #[arrrg(optional, "History file (default: owllama_chat_history.json)", "PATH")]
    pub history_file: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Append raw chat traffic to this file.
    #[arrrg(optional, "Log chat requests and responses as JSON lines", "PATH")]
    pub log_file: Option<String>,

    /// Substring of model names whose replies contain reasoning blocks.
    #[arrrg(optional, "Model marker enabling think filtering (default: qwen3)", "MARKER")]
    pub reasoning_marker: Option<String>,

    /// Opening reasoning marker.
    #[arrrg(optional, "Reasoning block start marker (default: <think>)", "TEXT")]
    pub think_start: Option<String>,

    /// Closing reasoning marker.
    #[arrrg(optional, "Reasoning block end marker (default: </think>)", "TEXT")]
    pub think_end: Option<String>,

    /// Build the first prompt step by step.
    #[arrrg(flag, "Build the first prompt step by step")]
    pub guided: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Disable the progress spinner.
    #[arrrg(flag, "Disable the progress spinner")]
    pub no_spinner: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to chat with.
    pub model: String,

    /// Server address; `None` defers to the environment.
    pub host: Option<String>,

    /// Path of the history file.
    pub history_path: PathBuf,

    /// Optional request timeout.
    pub timeout: Option<Duration>,

    /// Optional path for the JSON-lines traffic log.
    pub log_path: Option<PathBuf>,

    /// Reasoning markup filtering for display.
    pub think: ThinkFilter,

    /// Whether to start with the guided prompt builder.
    pub guided: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to draw a spinner while waiting for a reply.
    pub show_spinner: bool,

    /// Editor command used by `/edit`.
    pub editor: String,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemma3
    /// - History: owllama_chat_history.json
    /// - Think filter: `<think>`/`</think>` for qwen3 models
    /// - Color and spinner: enabled
    /// - Editor: `$EDITOR`, else `vi`
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: None,
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            timeout: None,
            log_path: None,
            think: ThinkFilter::default(),
            guided: false,
            use_color: true,
            show_spinner: true,
            editor: default_editor(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the history file path.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    /// Sets the think filter.
    pub fn with_think_filter(mut self, think: ThinkFilter) -> Self {
        self.think = think;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the editor command used by `/edit`.
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    /// Disables the spinner.
    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let think = ThinkFilter::new(
            args.reasoning_marker
                .unwrap_or_else(|| DEFAULT_REASONING_MARKER.to_string()),
            args.think_start
                .unwrap_or_else(|| DEFAULT_THINK_START.to_string()),
            args.think_end.unwrap_or_else(|| DEFAULT_THINK_END.to_string()),
        );

        ChatConfig {
            host: args.host,
            history_path: args
                .history_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE)),
            timeout: args.timeout_secs.map(Duration::from_secs),
            log_path: args.log_file.map(PathBuf::from),
            think,
            guided: args.guided,
            use_color: !args.no_color,
            show_spinner: !args.no_spinner,
            ..ChatConfig::new()
        }
    }
}
