//! Progress indicator shown while a turn is in flight.

use std::io::{self, Write};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// ANSI sequence returning to column zero and erasing the line.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// A spinner drawn on stderr by a background task.
///
/// The task runs until [`Spinner::stop`] cancels it and waits for it to
/// erase its line.  Dropping a running spinner cancels it without waiting.
pub struct Spinner {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Starts a spinner labelled `label`, or an inert one if `enabled` is false.
    pub fn start(enabled: bool, label: &str) -> Self {
        let cancel = CancellationToken::new();
        let task = enabled.then(|| {
            let token = cancel.clone();
            let label = label.to_string();
            tokio::spawn(async move { spin(token, label).await })
        });
        Self { cancel, task }
    }

    /// Whether a task is drawing.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the spinner and waits until its output has been erased.
    ///
    /// Returns true if a drawing task ran and has exited.
    pub async fn stop(mut self) -> bool {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task.await.is_ok(),
            None => false,
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn spin(cancel: CancellationToken, label: String) {
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    let mut frames = FRAMES.iter().cycle();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Some(frame) = frames.next() {
                    let mut stderr = io::stderr();
                    let _ = write!(stderr, "\r{frame} {label}");
                    let _ = stderr.flush();
                }
            }
        }
    }
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{CLEAR_LINE}");
    let _ = stderr.flush();
}
