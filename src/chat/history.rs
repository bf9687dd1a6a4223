//! Durable record of past chat sessions.
//!
//! History lives in a single pretty-printed JSON document:
//!
//! ```json
//! {
//!   "sessions": [
//!     {
//!       "session_key": "1f2e3d4c",
//!       "messages": [{"role": "user", "content": "..."}]
//!     }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::observability::{HISTORY_LOAD_FAILURES, HISTORY_SAVES};
use crate::types::{Message, MessageRole};

/// Default location of the history file, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "owllama_chat_history.json";

/// Number of characters of the first prompt shown in summaries.
pub const SUMMARY_CHARS: usize = 40;

/// One finished conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Opaque key, unique per run.
    pub session_key: String,
    /// Every completed turn, user then assistant, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            messages: Vec::new(),
        }
    }

    /// Whether the session holds at least one non-blank user message.
    pub fn has_user_input(&self) -> bool {
        self.messages.iter().any(Message::is_substantive_user_input)
    }

    /// The first user message, if any.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == MessageRole::User)
    }
}

/// A line of `history list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// The session's key.
    pub session_key: String,
    /// The first user message, cut to [`SUMMARY_CHARS`] characters.
    pub preview: String,
}

/// All recorded sessions, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    /// The sessions.
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl History {
    /// Number of recorded sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been recorded.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Appends a finished session.
    pub fn push(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Key and truncated first prompt of every session.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|session| SessionSummary {
                session_key: session.session_key.clone(),
                preview: session
                    .first_user_message()
                    .map(|m| truncate_chars(&m.content, SUMMARY_CHARS))
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Messages of the session with exactly `session_key`.
    ///
    /// A known session with no messages is `Ok(&[])`; an unknown key is
    /// [`Error::NotFound`].
    pub fn view(&self, session_key: &str) -> Result<&[Message]> {
        self.sessions
            .iter()
            .find(|s| s.session_key == session_key)
            .map(|s| s.messages.as_slice())
            .ok_or_else(|| {
                Error::not_found(
                    "Session not found.",
                    Some("session".to_string()),
                    Some(session_key.to_string()),
                )
            })
    }
}

/// One line of `history view` output: `"<Role>: <content>"`.
pub fn view_line(message: &Message) -> String {
    format!("{}: {}", message.role.display_name(), message.content)
}

/// The first `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reads and writes [`History`] at a fixed path.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads history.
    ///
    /// A missing file is the normal first-run state; an unreadable or corrupt
    /// file is treated the same way.  Neither is an error.
    pub fn load(&self) -> History {
        match self.try_load() {
            Ok(Some(history)) => history,
            Ok(None) => History::default(),
            Err(_) => {
                HISTORY_LOAD_FAILURES.click();
                History::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<History>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to open history file", err)),
        };
        let reader = BufReader::new(file);
        let history: History = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse history file", Some(Box::new(err)))
        })?;
        Ok(Some(history))
    }

    /// Writes `history`, replacing the file.
    ///
    /// The document goes to a temporary file in the same directory first and
    /// is renamed into place, so readers see either the old or the new file.
    pub fn save(&self, history: &History) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)
            .map_err(|err| Error::io("failed to create history file", err))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            to_writer_pretty(&mut writer, history).map_err(|err| {
                Error::serialization("failed to serialize history", Some(Box::new(err)))
            })?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|err| Error::io("failed to write history file", err))?;
        }
        temp.persist(&self.path)
            .map_err(|err| Error::io("failed to replace history file", err.error))?;
        HISTORY_SAVES.click();
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(key: &str, turns: &[(&str, &str)]) -> Session {
        let mut session = Session::new(key);
        for (user, assistant) in turns {
            session.messages.push(Message::user(*user));
            session.messages.push(Message::assistant(*assistant));
        }
        session
    }

    #[test]
    fn view_lines_capitalize_roles() {
        let mut history = History::default();
        history.push(session("k", &[("hi", "hello")]));
        let lines: Vec<String> = history.view("k").unwrap().iter().map(view_line).collect();
        assert_eq!(lines, vec!["User: hi", "Assistant: hello"]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{\"sessions\": [ {").unwrap();
        let store = HistoryStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        let mut history = store.load();
        history.push(session("aaaa0001", &[("hi", "hello"), ("why?", "because")]));
        store.save(&history).unwrap();

        let mut reloaded = store.load();
        assert_eq!(reloaded, history);

        reloaded.push(session("aaaa0002", &[("again", "sure")]));
        store.save(&reloaded).unwrap();
        let keys: Vec<String> = store
            .load()
            .sessions
            .into_iter()
            .map(|s| s.session_key)
            .collect();
        assert_eq!(keys, vec!["aaaa0001", "aaaa0002"]);
    }

    #[test]
    fn saved_file_is_two_space_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::new(&path);
        let mut history = History::default();
        history.push(session("k", &[("q", "a")]));
        store.save(&history).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"sessions\": [\n    {\n      \"session_key\": \"k\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn reads_legacy_assistant_role() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"{"sessions":[{"session_key":"0badf00d","messages":[
                {"role":"user","content":"hi"},
                {"role":"ollama","content":"hello"}]}]}"#,
        )
        .unwrap();
        let history = HistoryStore::new(&path).load();
        let messages = history.view("0badf00d").unwrap();
        assert_eq!(messages[1], Message::assistant("hello"));
    }

    #[test]
    fn summaries_truncate_by_characters() {
        let exact: String = "x".repeat(SUMMARY_CHARS);
        let long: String = "é".repeat(SUMMARY_CHARS + 10);
        let mut history = History::default();
        history.push(session("short", &[("hello", "hi")]));
        history.push(session("exact", &[(exact.as_str(), "ok")]));
        history.push(session("long", &[(long.as_str(), "ok")]));
        history.push(Session::new("empty"));

        let summaries = history.summaries();
        assert_eq!(summaries[0].preview, "hello");
        assert_eq!(summaries[1].preview, exact);
        assert_eq!(summaries[2].preview.chars().count(), SUMMARY_CHARS);
        assert_eq!(summaries[2].preview, "é".repeat(SUMMARY_CHARS));
        assert_eq!(summaries[3].preview, "");
    }

    #[test]
    fn summary_uses_first_user_message() {
        let mut s = Session::new("k");
        s.messages.push(Message::assistant("search result"));
        s.messages.push(Message::user("the question"));
        let mut history = History::default();
        history.push(s);
        assert_eq!(history.summaries()[0].preview, "the question");
    }

    #[test]
    fn view_distinguishes_empty_from_missing() {
        let mut history = History::default();
        history.push(Session::new("empty"));
        history.push(session("full", &[("q", "a")]));

        assert_eq!(history.view("empty").unwrap(), &[] as &[Message]);
        assert_eq!(history.view("full").unwrap().len(), 2);
        let err = history.view("nope").unwrap_err();
        assert!(err.is_not_found());
        assert!(history.view("ful").is_err());
    }

    #[test]
    fn user_input_detection() {
        assert!(session("k", &[("q", "a")]).has_user_input());
        assert!(!session("k", &[("   ", "a")]).has_user_input());
        assert!(!Session::new("k").has_user_input());
    }
}
