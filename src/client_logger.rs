//! Logging trait for Ollama client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log the chat traffic passing through the [`Ollama`](crate::Ollama)
//! client, and [`JsonLinesLogger`], which appends every record to a file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;

use crate::error::{Error, Result};
use crate::types::ChatRequest;

/// A trait for logging Ollama client operations.
///
/// # Example
///
/// ```rust,ignore
/// use owllama::{ChatRequest, ClientLogger};
///
/// struct StderrLogger;
///
/// impl ClientLogger for StderrLogger {
///     fn log_chat_request(&self, request: &ChatRequest) {
///         eprintln!("-> {} messages to {}", request.messages.len(), request.model);
///     }
///
///     fn log_chat_response(&self, status: u16, body: &[u8]) {
///         eprintln!("<- {status}: {} bytes", body.len());
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing chat request.
    ///
    /// Called once per `chat` call, before the request is sent.
    fn log_chat_request(&self, request: &ChatRequest);

    /// Log the raw body of a chat response.
    ///
    /// Called once per `chat` call whose response body was read, whether or
    /// not the status indicated success.
    fn log_chat_response(&self, status: u16, body: &[u8]);
}

/// A [`ClientLogger`] that appends one JSON object per line to a file.
pub struct JsonLinesLogger {
    file: Mutex<File>,
}

impl JsonLinesLogger {
    /// Opens (or creates) `path` for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|err| Error::io("failed to open log file", err))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_record(&self, record: serde_json::Value) {
        // A poisoned lock or a failed write drops the record.
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{record}");
        }
    }
}

impl ClientLogger for JsonLinesLogger {
    fn log_chat_request(&self, request: &ChatRequest) {
        self.write_record(json!({
            "kind": "chat_request",
            "request": request,
        }));
    }

    fn log_chat_response(&self, status: u16, body: &[u8]) {
        self.write_record(json!({
            "kind": "chat_response",
            "status": status,
            "body": String::from_utf8_lossy(body),
        }));
    }
}
