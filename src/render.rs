//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the session
//! engine does not write to the terminal directly.  The default
//! implementation prints plain text with optional ANSI colours.

use std::io::{self, Stdout, Write};

/// ANSI escape code for bold cyan text (used for the user label).
const ANSI_USER: &str = "\x1b[1;36m";

/// ANSI escape code for bold green text (used for the assistant label).
const ANSI_ASSISTANT: &str = "\x1b[1;32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed above assistant replies.
const ASSISTANT_LABEL: &str = "Ollama";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Echo the user's side of a completed turn.
    fn print_user(&mut self, text: &str);

    /// Print the assistant's (display-filtered) reply.
    fn print_assistant(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
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
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, style: &str, label: &str) -> String {
        if self.use_color {
            format!("{style}{label}:{ANSI_RESET}")
        } else {
            format!("{label}:")
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_user(&mut self, text: &str) {
        println!("{}", self.label(ANSI_USER, "You"));
        println!("{text}");
        self.flush();
    }

    fn print_assistant(&mut self, text: &str) {
        let label = self.label(ANSI_ASSISTANT, ASSISTANT_LABEL);
        println!("{label}");
        println!("{}", text.trim_end());
        println!();
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}{error}{ANSI_RESET}");
        } else {
            eprintln!("{error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }
}
