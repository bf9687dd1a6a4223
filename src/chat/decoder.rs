//! Decoding of `/api/chat` response bodies.
//!
//! The server answers with one JSON object per line.  Lines are decoded
//! independently and the assistant's fragments are concatenated; malformed
//! lines are skipped and decoding stops at the first chunk marked `done`.

use crate::observability::{DECODE_LINES, DECODE_SKIPPED_LINES};
use crate::types::ChatChunk;

/// Accumulates the assistant's reply from response lines.
#[derive(Debug, Default)]
pub struct ChatDecoder {
    text: String,
    done: bool,
    skipped: usize,
}

impl ChatDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line of the body (without its newline).
    ///
    /// Returns `true` once a `done` chunk has been seen; lines pushed after
    /// that are ignored.
    pub fn push_line(&mut self, line: &[u8]) -> bool {
        if self.done {
            return true;
        }
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            return false;
        }
        DECODE_LINES.click();
        let chunk = match serde_json::from_slice::<ChatChunk>(line) {
            Ok(chunk) => chunk,
            Err(_) => {
                DECODE_SKIPPED_LINES.click();
                self.skipped += 1;
                return false;
            }
        };
        if chunk.message.is_assistant() {
            self.text.push_str(&chunk.message.content);
        }
        self.done = chunk.done;
        self.done
    }

    /// Whether a `done` chunk has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of lines that failed to parse.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Returns the accumulated reply.
    pub fn finish(self) -> String {
        self.text
    }
}

/// Decodes a complete response body into the assistant's reply text.
///
/// Never fails: a body with no usable assistant content decodes to `""`.
pub fn decode_chat_body(body: &[u8]) -> String {
    let mut decoder = ChatDecoder::new();
    for line in body.split(|b| *b == b'\n') {
        if decoder.push_line(line) {
            break;
        }
    }
    decoder.finish()
}
