//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! context sent to the server, the transcript kept for history, and the
//! request cycle of a single turn.

use async_trait::async_trait;
use bytes::Bytes;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::config::ChatConfig;
use crate::chat::decoder::decode_chat_body;
use crate::chat::editor::compose_in_editor;
use crate::chat::history::{History, HistoryStore, Session};
use crate::chat::search::KnowledgeSource;
use crate::chat::spinner::Spinner;
use crate::error::{Error, Result};
use crate::observability::{CHAT_TURN_ERRORS, CHAT_TURNS};
use crate::render::Renderer;
use crate::types::{ChatRequest, Message};
use crate::Ollama;

/// The inference endpoint as seen by the session.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `request` and returns the complete, undecoded response body.
    ///
    /// Transport failures and non-success statuses are errors.
    async fn chat(&self, request: &ChatRequest) -> Result<Bytes>;
}

#[async_trait]
impl ChatBackend for Ollama {
    async fn chat(&self, request: &ChatRequest) -> Result<Bytes> {
        Ollama::chat(self, request).await
    }
}

/// Source of session keys.
pub trait SessionKeyGenerator {
    /// Returns a key that has not been used before.
    fn generate(&mut self) -> String;
}

/// Eight hex digits from 32 random bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl SessionKeyGenerator for RandomKeyGenerator {
    fn generate(&mut self) -> String {
        format!("{:08x}", rand::random::<u32>())
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line of input.
    AwaitingInput,
    /// A request is in flight.
    Processing,
    /// The session has ended; no further turns are accepted.
    Terminated,
}

/// What the caller should do after a line of input was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop reading and call [`ChatSession::finish`].
    Exit,
}

/// A chat session that manages conversation state and server interactions.
///
/// The context is what the server sees: every message since the last
/// `/clear`, resent in full each turn because the server keeps no state.
/// The transcript is what history keeps: every completed turn, regardless of
/// clears.
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    config: ChatConfig,
    store: HistoryStore,
    history: History,
    context: Vec<Message>,
    transcript: Session,
    state: SessionState,
    finalized: bool,
    knowledge: Option<Box<dyn KnowledgeSource>>,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Starts a session: draws a fresh key and loads history from `store`.
    ///
    /// An absent or unreadable history file yields an empty history.
    pub fn start(
        backend: B,
        config: ChatConfig,
        store: HistoryStore,
        keys: &mut dyn SessionKeyGenerator,
    ) -> Self {
        let transcript = Session::new(keys.generate());
        let history = store.load();
        Self {
            backend,
            config,
            store,
            history,
            context: Vec::new(),
            transcript,
            state: SessionState::AwaitingInput,
            finalized: false,
            knowledge: None,
        }
    }

    /// Enables `/search` through `source`.
    pub fn with_knowledge_source(mut self, source: Box<dyn KnowledgeSource>) -> Self {
        self.knowledge = Some(source);
        self
    }

    /// The backend this session talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The key this session will be saved under.
    pub fn session_key(&self) -> &str {
        &self.transcript.session_key
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The model replies come from.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Messages that will accompany the next request.
    pub fn context(&self) -> &[Message] {
        &self.context
    }

    /// Completed turns of this session.
    pub fn transcript(&self) -> &Session {
        &self.transcript
    }

    /// History as loaded at start (plus this session once finished).
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Forgets the context.  The transcript is untouched.
    pub fn clear(&mut self) {
        self.context.clear();
    }

    /// Handles one line of user input.
    ///
    /// Commands are executed, blank input is ignored, and anything else is a
    /// turn.  Text composed with `/edit` is handled as if it had been typed.
    /// Failures are reported through `renderer` and never end the session.
    pub async fn handle_input(&mut self, input: &str, renderer: &mut dyn Renderer) -> Flow {
        let mut input = input.trim().to_string();
        loop {
            if self.state == SessionState::Terminated {
                return Flow::Exit;
            }
            if input.is_empty() {
                return Flow::Continue;
            }

            match parse_command(&input) {
                Some(ChatCommand::Exit) => {
                    self.state = SessionState::Terminated;
                    renderer.print_info("Exiting chat session.");
                    return Flow::Exit;
                }
                Some(ChatCommand::Clear) => {
                    self.clear();
                    renderer.print_info("Context cleared.");
                }
                Some(ChatCommand::Help) => {
                    renderer.print_info(help_text());
                }
                Some(ChatCommand::Edit) => match compose_in_editor(&self.config.editor).await {
                    Ok(Some(text)) => {
                        input = text;
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => renderer.print_error(&format!("Editor error: {err}")),
                },
                Some(ChatCommand::Search(query)) => {
                    renderer.print_info(&format!("Searching the internet for: {query}"));
                    match self.search(&query).await {
                        Ok(result) => renderer.print_info(&format!("Search result: {result}")),
                        Err(err) => renderer.print_error(&format!("Search error: {err}")),
                    }
                }
                Some(ChatCommand::Invalid(message)) => {
                    renderer.print_info(&message);
                }
                None => self.run_turn(&input, renderer).await,
            }
            return Flow::Continue;
        }
    }

    async fn run_turn(&mut self, text: &str, renderer: &mut dyn Renderer) {
        if let Err(err) = self.submit(text, renderer).await {
            renderer.print_error(&format!("Error contacting Ollama API: {err}"));
        }
    }

    /// Sends `text` as a turn and returns the assistant's unfiltered reply.
    ///
    /// This method:
    /// 1. Adds the user message to the context
    /// 2. Sends the whole context to the server, with the spinner running
    /// 3. Decodes the reply and displays it with reasoning blocks removed
    /// 4. Adds the raw reply to the context and the turn to the transcript
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.  The user message stays in the
    /// context and nothing is added to the transcript.
    pub async fn submit(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<String> {
        if self.state == SessionState::Terminated {
            return Err(Error::validation("the chat session has ended", None));
        }

        self.context.push(Message::user(text));
        self.state = SessionState::Processing;

        let request = ChatRequest::new(self.config.model.clone(), self.context.clone());
        let spinner = Spinner::start(self.config.show_spinner, "Thinking...");
        let result = self.backend.chat(&request).await;
        spinner.stop().await;
        self.state = SessionState::AwaitingInput;

        let body = result.inspect_err(|_| CHAT_TURN_ERRORS.click())?;
        let reply = decode_chat_body(&body);
        let display = self.config.think.filter(&self.config.model, &reply);
        renderer.print_user(text);
        renderer.print_assistant(&display);

        self.context.push(Message::assistant(reply.clone()));
        self.transcript.messages.push(Message::user(text));
        self.transcript.messages.push(Message::assistant(reply.clone()));
        CHAT_TURNS.click();
        Ok(reply)
    }

    /// Looks `query` up and appends the result to the context as an
    /// assistant message.  The transcript is untouched.
    pub async fn search(&mut self, query: &str) -> Result<String> {
        let source = self.knowledge.as_ref().ok_or_else(|| {
            Error::validation("search is not available in this session", None)
        })?;
        let result = source.lookup(query).await?;
        self.context.push(Message::assistant(result.clone()));
        Ok(result)
    }

    /// Ends the session and records it in history.
    ///
    /// The transcript is saved only if it holds a non-blank user message.
    /// Returns whether history was written.  Calling this again is a no-op.
    pub fn finish(&mut self) -> Result<bool> {
        self.state = SessionState::Terminated;
        if self.finalized {
            return Ok(false);
        }
        self.finalized = true;
        if !self.transcript.has_user_input() {
            return Ok(false);
        }
        self.history.push(self.transcript.clone());
        self.store.save(&self.history)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::think::ThinkFilter;
    use crate::types::MessageRole;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a script and records every request.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<Bytes>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn reply(self, text: &str) -> Self {
            let body = format!(
                "{}\n{}\n",
                serde_json::json!({"message": {"role": "assistant", "content": text}, "done": false}),
                serde_json::json!({"message": {"role": "assistant", "content": ""}, "done": true}),
            );
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(Bytes::from(body)));
            self
        }

        fn fail(self) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(Error::connection("connection refused", None)));
            self
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<Bytes> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::api(500, "script exhausted")))
        }
    }

    struct FixedKeys(Vec<&'static str>);

    impl SessionKeyGenerator for FixedKeys {
        fn generate(&mut self) -> String {
            self.0.remove(0).to_string()
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        user: Vec<String>,
        assistant: Vec<String>,
        errors: Vec<String>,
        info: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn print_user(&mut self, text: &str) {
            self.user.push(text.to_string());
        }

        fn print_assistant(&mut self, text: &str) {
            self.assistant.push(text.to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.info.push(info.to_string());
        }
    }

    struct StaticKnowledge;

    #[async_trait]
    impl KnowledgeSource for StaticKnowledge {
        async fn lookup(&self, query: &str) -> Result<String> {
            Ok(format!("{query}: a systems programming language"))
        }
    }

    fn session_with(
        backend: ScriptedBackend,
        dir: &tempfile::TempDir,
    ) -> ChatSession<ScriptedBackend> {
        let config = ChatConfig::new().without_spinner().without_color();
        let store = HistoryStore::new(dir.path().join("history.json"));
        ChatSession::start(backend, config, store, &mut FixedKeys(vec!["cafef00d"]))
    }

    fn roles(messages: &[Message]) -> Vec<MessageRole> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn random_keys_are_eight_hex_digits() {
        let mut keys = RandomKeyGenerator;
        let key = keys.generate();
        assert_eq!(key.len(), 8);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn new_session_awaits_input() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with(ScriptedBackend::default(), &dir);
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.session_key(), "cafef00d");
        assert!(session.context().is_empty());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn context_accumulates_and_is_resent_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default()
            .reply("one")
            .reply("two")
            .reply("three");
        let mut session = session_with(backend, &dir);
        let mut renderer = RecordingRenderer::default();

        for input in ["first", "second", "third"] {
            assert_eq!(session.handle_input(input, &mut renderer).await, Flow::Continue);
        }

        assert_eq!(session.context().len(), 6);
        assert_eq!(
            roles(session.context()),
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
            ]
        );
        assert_eq!(session.context()[5], Message::assistant("three"));

        let requests = session.backend().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].model, "gemma3");
        assert_eq!(requests[0].messages, vec![Message::user("first")]);
        assert_eq!(
            requests[2].messages,
            vec![
                Message::user("first"),
                Message::assistant("one"),
                Message::user("second"),
                Message::assistant("two"),
                Message::user("third"),
            ]
        );
        assert_eq!(renderer.user, vec!["first", "second", "third"]);
        assert_eq!(renderer.assistant, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn clear_resets_context_but_not_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default().reply("a1").reply("a2");
        let mut session = session_with(backend, &dir);
        let mut renderer = RecordingRenderer::default();

        session.handle_input("q1", &mut renderer).await;
        assert_eq!(session.handle_input("/clear", &mut renderer).await, Flow::Continue);
        assert!(session.context().is_empty());
        assert_eq!(session.transcript().messages.len(), 2);
        assert!(renderer.info.contains(&"Context cleared.".to_string()));

        session.handle_input("q2", &mut renderer).await;
        let requests = session.backend().requests();
        assert_eq!(requests[1].messages, vec![Message::user("q2")]);
        assert_eq!(session.context().len(), 2);
        assert_eq!(session.transcript().messages.len(), 4);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default(), &dir);
        let mut renderer = RecordingRenderer::default();

        for input in ["", "   ", "\t\n"] {
            assert_eq!(session.handle_input(input, &mut renderer).await, Flow::Continue);
        }
        assert!(session.context().is_empty());
        assert!(session.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn failed_turn_keeps_user_message_and_retry_adds_one_reply() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default().fail().reply("finally");
        let mut session = session_with(backend, &dir);
        let mut renderer = RecordingRenderer::default();

        session.handle_input("hello?", &mut renderer).await;
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.context(), &[Message::user("hello?")]);
        assert!(session.transcript().messages.is_empty());
        assert_eq!(renderer.errors.len(), 1);
        assert!(renderer.errors[0].contains("connection refused"));
        assert!(renderer.assistant.is_empty());

        session.handle_input("hello?", &mut renderer).await;
        assert_eq!(
            session.context(),
            &[
                Message::user("hello?"),
                Message::user("hello?"),
                Message::assistant("finally"),
            ]
        );
        assert_eq!(
            session
                .context()
                .iter()
                .filter(|m| m.role == MessageRole::Assistant)
                .count(),
            1
        );
        assert_eq!(
            session.transcript().messages,
            vec![Message::user("hello?"), Message::assistant("finally")]
        );
    }

    #[tokio::test]
    async fn submit_surfaces_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default().fail(), &dir);
        let mut renderer = RecordingRenderer::default();
        let err = session.submit("hi", &mut renderer).await.unwrap_err();
        assert!(err.is_connection());
        assert!(renderer.errors.is_empty());
    }

    #[tokio::test]
    async fn reasoning_is_hidden_from_display_but_stored() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default().reply("<think>hmm</think>Answer");
        let config = ChatConfig::new()
            .with_model("qwen3:4b")
            .with_think_filter(ThinkFilter::default())
            .without_spinner();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let mut session = ChatSession::start(backend, config, store, &mut FixedKeys(vec!["k"]));
        let mut renderer = RecordingRenderer::default();

        let reply = session.submit("why?", &mut renderer).await.unwrap();
        assert_eq!(reply, "<think>hmm</think>Answer");
        assert_eq!(renderer.assistant, vec!["Answer"]);
        assert_eq!(
            session.context()[1],
            Message::assistant("<think>hmm</think>Answer")
        );
        assert_eq!(
            session.transcript().messages[1],
            Message::assistant("<think>hmm</think>Answer")
        );
    }

    #[tokio::test]
    async fn exit_terminates_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default().reply("hi!"), &dir);
        let mut renderer = RecordingRenderer::default();

        session.handle_input("hello", &mut renderer).await;
        assert_eq!(session.handle_input("/exit", &mut renderer).await, Flow::Exit);
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(session.handle_input("more", &mut renderer).await, Flow::Exit);
        assert_eq!(session.backend().requests().len(), 1);

        assert!(session.finish().unwrap());
        assert!(!session.finish().unwrap());

        let history = HistoryStore::new(dir.path().join("history.json")).load();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.view("cafef00d").unwrap(),
            &[Message::user("hello"), Message::assistant("hi!")]
        );
    }

    #[tokio::test]
    async fn empty_session_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::new(&path);
        let mut existing = History::default();
        existing.push(Session {
            session_key: "00000001".to_string(),
            messages: vec![Message::user("old"), Message::assistant("reply")],
        });
        store.save(&existing).unwrap();

        let mut session = session_with(ScriptedBackend::default().fail(), &dir);
        let mut renderer = RecordingRenderer::default();
        session.handle_input("/clear", &mut renderer).await;
        session.handle_input("lost to a failed request", &mut renderer).await;
        session.handle_input("/exit", &mut renderer).await;

        assert!(!session.finish().unwrap());
        assert_eq!(store.load(), existing);
    }

    #[tokio::test]
    async fn session_appends_to_existing_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let mut existing = History::default();
        existing.push(Session::new("00000001"));
        store.save(&existing).unwrap();

        let mut session = session_with(ScriptedBackend::default().reply("r"), &dir);
        assert_eq!(session.history().len(), 1);
        let mut renderer = RecordingRenderer::default();
        session.handle_input("q", &mut renderer).await;
        assert!(session.finish().unwrap());

        let keys: Vec<String> = store
            .load()
            .sessions
            .into_iter()
            .map(|s| s.session_key)
            .collect();
        assert_eq!(keys, vec!["00000001", "cafef00d"]);
    }

    #[tokio::test]
    async fn search_adds_context_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default(), &dir)
            .with_knowledge_source(Box::new(StaticKnowledge));
        let mut renderer = RecordingRenderer::default();

        session.handle_input("/search Rust", &mut renderer).await;
        assert_eq!(
            session.context(),
            &[Message::assistant("Rust: a systems programming language")]
        );
        assert!(session.transcript().messages.is_empty());
        assert!(session.backend().requests().is_empty());
        assert!(
            renderer
                .info
                .contains(&"Search result: Rust: a systems programming language".to_string())
        );
    }

    #[tokio::test]
    async fn search_without_source_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default(), &dir);
        let mut renderer = RecordingRenderer::default();

        session.handle_input("/search Rust", &mut renderer).await;
        assert!(session.context().is_empty());
        assert_eq!(renderer.errors.len(), 1);

        session.handle_input("/search", &mut renderer).await;
        assert!(
            renderer
                .info
                .contains(&"Please provide a search query.".to_string())
        );
    }

    #[cfg(unix)]
    fn editor_writing(dir: &std::path::Path, text: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("compose");
        std::fs::write(&path, format!("#!/bin/sh\nprintf '%s' '{text}' > \"$1\"\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn session_composing(
        backend: ScriptedBackend,
        dir: &tempfile::TempDir,
        text: &str,
    ) -> ChatSession<ScriptedBackend> {
        let config = ChatConfig::new()
            .without_spinner()
            .with_editor(editor_writing(dir.path(), text));
        let store = HistoryStore::new(dir.path().join("history.json"));
        ChatSession::start(backend, config, store, &mut FixedKeys(vec!["e"]))
            .with_knowledge_source(Box::new(StaticKnowledge))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn composed_text_is_a_turn() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default().reply("ok");
        let mut session = session_composing(backend, &dir, "from the editor");
        let mut renderer = RecordingRenderer::default();

        assert_eq!(session.handle_input("/edit", &mut renderer).await, Flow::Continue);
        assert_eq!(
            session.context(),
            &[Message::user("from the editor"), Message::assistant("ok")]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn composed_commands_are_executed() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_composing(ScriptedBackend::default(), &dir, "/exit");
        let mut renderer = RecordingRenderer::default();
        assert_eq!(session.handle_input("/vi", &mut renderer).await, Flow::Exit);
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.backend().requests().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let mut session = session_composing(ScriptedBackend::default(), &dir, "/search Rust");
        assert_eq!(session.handle_input("/edit", &mut renderer).await, Flow::Continue);
        assert_eq!(
            session.context(),
            &[Message::assistant("Rust: a systems programming language")]
        );
        assert!(session.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_slash_words_are_turns() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(ScriptedBackend::default().reply("ok"), &dir);
        let mut renderer = RecordingRenderer::default();

        session.handle_input("/shrug", &mut renderer).await;
        assert_eq!(session.context()[0], Message::user("/shrug"));
    }

    #[tokio::test]
    async fn empty_reply_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::default();
        backend
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(Bytes::from_static(b"garbage\n{\"done\":true}\n")));
        let mut session = session_with(backend, &dir);
        let mut renderer = RecordingRenderer::default();

        let reply = session.submit("hi", &mut renderer).await.unwrap();
        assert_eq!(reply, "");
        assert_eq!(session.context().len(), 2);
        assert!(renderer.errors.is_empty());
    }
}
