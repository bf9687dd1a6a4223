//! Composing a message in the user's editor.

use std::env;

use tempfile::Builder;

use crate::error::{Error, Result};

/// Editor used when `$EDITOR` is unset.
pub const FALLBACK_EDITOR: &str = "vi";

/// The editor command from `$EDITOR`, or [`FALLBACK_EDITOR`].
pub fn default_editor() -> String {
    env::var("EDITOR")
        .ok()
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Opens an empty temporary markdown file in `editor` and returns what the
/// user wrote, trimmed.  Returns `None` if nothing was written.
///
/// `editor` may carry arguments (`code --wait`); it is split on whitespace.
/// The temporary file is removed afterwards.
pub async fn compose_in_editor(editor: &str) -> Result<Option<String>> {
    let mut words = editor.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| Error::validation("no editor configured", Some("EDITOR".to_string())))?;

    let file = Builder::new()
        .prefix("owllama_edit_")
        .suffix(".md")
        .tempfile()
        .map_err(|err| Error::io("could not create temp file", err))?;

    let status = tokio::process::Command::new(program)
        .args(words)
        .arg(file.path())
        .status()
        .await
        .map_err(|err| Error::io(format!("could not launch {program}"), err))?;
    if !status.success() {
        return Err(Error::validation(
            format!("{program} exited with {status}"),
            Some("EDITOR".to_string()),
        ));
    }

    let content = tokio::fs::read_to_string(file.path())
        .await
        .map_err(|err| Error::io("could not read temp file", err))?;
    let content = content.trim();
    Ok((!content.is_empty()).then(|| content.to_string()))
}
