//! Removal of reasoning markup from replies shown to the user.

/// Default substring identifying reasoning-capable model families.
pub const DEFAULT_REASONING_MARKER: &str = "qwen3";

/// Default opening marker of a reasoning block.
pub const DEFAULT_THINK_START: &str = "<think>";

/// Default closing marker of a reasoning block.
pub const DEFAULT_THINK_END: &str = "</think>";

/// Strips reasoning blocks from display text for matching models.
///
/// Stored messages are never filtered; only what is printed is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkFilter {
    /// Substring a model name must contain for filtering to apply.
    pub model_marker: String,
    /// Opening marker.
    pub start: String,
    /// Closing marker.
    pub end: String,
}

impl ThinkFilter {
    /// Creates a filter with explicit markers.
    pub fn new(
        model_marker: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            model_marker: model_marker.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Returns true if replies from `model` are filtered.
    pub fn applies_to(&self, model: &str) -> bool {
        !self.model_marker.is_empty() && model.contains(&self.model_marker)
    }

    /// Returns `text` with every matched reasoning block removed.
    ///
    /// The first start marker is paired with the first end marker.  When
    /// either is missing, or the end does not follow the start, the remaining
    /// text is returned untouched.
    pub fn filter(&self, model: &str, text: &str) -> String {
        if !self.applies_to(model) || self.start.is_empty() || self.end.is_empty() {
            return text.to_string();
        }
        let mut text = text.to_string();
        loop {
            let (Some(start), Some(end)) = (text.find(&self.start), text.find(&self.end)) else {
                break;
            };
            if end < start + self.start.len() {
                break;
            }
            text.replace_range(start..end + self.end.len(), "");
        }
        text
    }
}

impl Default for ThinkFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_REASONING_MARKER,
            DEFAULT_THINK_START,
            DEFAULT_THINK_END,
        )
    }
}
