use serde::{Deserialize, Serialize};

/// The message fragment carried by a [`ChatChunk`].
///
/// The role is kept as a string because the server may emit roles this
/// client never stores (e.g. `tool`); such fragments are simply not
/// accumulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMessage {
    /// Role of the fragment's author.
    #[serde(default)]
    pub role: String,

    /// Text of the fragment.
    #[serde(default)]
    pub content: String,
}

impl ChunkMessage {
    /// Returns true if this fragment belongs to the assistant's reply.
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// One line of a `/api/chat` response body.
///
/// Every field defaults so that any JSON object decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatChunk {
    /// The incremental message.
    #[serde(default)]
    pub message: ChunkMessage,

    /// Set on the final chunk of a reply.
    #[serde(default)]
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_with_missing_fields_decodes() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"model":"gemma3"}"#).unwrap();
        assert_eq!(chunk, ChatChunk::default());
        assert!(!chunk.message.is_assistant());
    }

    #[test]
    fn chunk_decodes_wire_line() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"model":"gemma3","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        )
        .unwrap();
        assert!(chunk.message.is_assistant());
        assert_eq!(chunk.message.content, "Hi");
        assert!(!chunk.done);
    }
}
