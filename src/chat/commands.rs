//! Command parsing for the chat session.
//!
//! A handful of exact inputs control the session instead of being sent to
//! the model.  Anything else, including unrecognized `/words`, is a turn.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// End the session.
    Exit,

    /// Forget the conversation context (the transcript is kept).
    Clear,

    /// Compose the next turn in an external editor.
    Edit,

    /// Look something up and add the result to the context.
    Search(String),

    /// Display help information.
    Help,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for chat commands.
///
/// Returns `Some(ChatCommand)` if the trimmed input is a command, or `None`
/// if it should be treated as a turn.  Blank input is not a command; callers
/// ignore it separately.
///
/// # Examples
///
/// ```
/// # use owllama::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/exit"), Some(ChatCommand::Exit));
/// assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
/// assert!(parse_command("Hello!").is_none());
/// assert!(parse_command("/unknown").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let command = match input {
        "/exit" | "/quit" => ChatCommand::Exit,
        "/clear" => ChatCommand::Clear,
        "/edit" | "/vi" => ChatCommand::Edit,
        "/help" => ChatCommand::Help,
        "/search" => ChatCommand::Invalid("Please provide a search query.".to_string()),
        _ => {
            let query = input.strip_prefix("/search ")?.trim();
            if query.is_empty() {
                ChatCommand::Invalid("Please provide a search query.".to_string())
            } else {
                ChatCommand::Search(query.to_string())
            }
        }
    };

    Some(command)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /exit, /quit           End the chat and save it to history
  /clear                 Reset the conversation context
  /edit, /vi             Write the next message in $EDITOR
  /search <query>        Look up a topic and add the summary to the context
  /help                  Show this help message"#
}
