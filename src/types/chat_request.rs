use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body of a `POST /api/chat` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The model to chat with.
    pub model: String,

    /// Every message of the active conversation, oldest first.
    pub messages: Vec<Message>,

    /// Whether the server should stream chunks.  Omitted by default, in which
    /// case the server streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Create a new request for `model` carrying `messages`.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: None,
        }
    }
}
