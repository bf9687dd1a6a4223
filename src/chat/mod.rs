//! Interactive chat with a model served by Ollama.
//!
//! This module provides the session engine behind `owllama chat`.  It
//! supports:
//!
//! - Multi-turn conversations with the full context resent each turn
//! - Display filtering of reasoning blocks
//! - Slash commands for session control
//! - Persistent session history
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: The session engine and its backend seam
//! - [`commands`]: Slash command parsing
//! - [`decoder`]: Reassembly of line-delimited reply bodies
//! - [`think`]: Reasoning block filtering
//! - [`history`]: The persistent session store

pub mod commands;
pub mod config;
pub mod decoder;
pub mod editor;
pub mod guide;
pub mod history;
pub mod search;
pub mod session;
pub mod spinner;
pub mod think;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_MODEL};
pub use decoder::{ChatDecoder, decode_chat_body};
pub use guide::build_guided_prompt;
pub use history::{History, HistoryStore, Session, SessionSummary, view_line};
pub use search::{KnowledgeSource, Wikipedia};
pub use session::{
    ChatBackend, ChatSession, Flow, RandomKeyGenerator, SessionKeyGenerator, SessionState,
};
pub use spinner::Spinner;
pub use think::ThinkFilter;
