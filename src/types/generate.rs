use serde::{Deserialize, Serialize};

/// Body of a `POST /api/generate` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    /// The model to generate with.
    pub model: String,

    /// The prompt to complete.
    pub prompt: String,

    /// Whether the server should stream chunks.  Omitted by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl GenerateRequest {
    /// Create a new generate request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: None,
        }
    }
}

/// One line of a `/api/generate` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateChunk {
    /// The next piece of generated text.
    #[serde(default)]
    pub response: String,

    /// Set on the final chunk.
    #[serde(default)]
    pub done: bool,

    /// Diagnostic text the server may emit mid-stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
